//! FrameSource: one open video, sampled every `skip_n_frames + 1` frames.

use std::path::PathBuf;

use super::decoder::{DecodeError, DecoderBackend, VideoDecoder};
use super::{Frame, VideoDescriptor, VideoId};

pub struct FrameSource {
    video_id: VideoId,
    path: PathBuf,
    decoder: Option<Box<dyn VideoDecoder>>,
    skip_n_frames: u32,
    /// Decoder index of the next frame to come out of the decoder
    next_index: u64,
    frames_emitted: u64,
}

impl FrameSource {
    pub fn open(
        video: &VideoDescriptor,
        backend: &dyn DecoderBackend,
        skip_n_frames: u32,
    ) -> Result<Self, DecodeError> {
        let decoder = backend.open(video)?;
        log::info!("opened video {} ({})", video.id(), video.path().display());
        Ok(Self {
            video_id: video.id(),
            path: video.path().to_path_buf(),
            decoder: Some(decoder),
            skip_n_frames,
            next_index: 0,
            frames_emitted: 0,
        })
    }

    /// Next sampled frame, converted to 8-bit grayscale.
    ///
    /// `None` is end of stream. A decode failure also ends the stream; it is
    /// logged and the decoder is released, it never reaches the caller.
    pub fn next_frame(&mut self) -> Option<Frame> {
        match self.pull() {
            Ok(Some(frame)) => {
                self.frames_emitted += 1;
                Some(frame)
            }
            Ok(None) => {
                self.release();
                None
            }
            Err(e) => {
                log::warn!(
                    "video {} ({}): decode failed at frame {}, treating as end of file: {}",
                    self.video_id,
                    self.path.display(),
                    self.next_index,
                    e
                );
                self.release();
                None
            }
        }
    }

    fn pull(&mut self) -> Result<Option<Frame>, DecodeError> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(None);
        };

        for _ in 0..self.skip_n_frames {
            if !decoder.skip()? {
                return Ok(None);
            }
            self.next_index += 1;
        }

        let Some(image) = decoder.read()? else {
            return Ok(None);
        };
        let frame_no = self.next_index;
        self.next_index += 1;

        let gray = image.into_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DecodeError::Frame(format!(
                "decoder produced an empty {}x{} image",
                gray.width(),
                gray.height()
            )));
        }
        Ok(Some(Frame::new(self.video_id, frame_no, gray)))
    }

    /// Drop the decoder handle. Idempotent.
    pub fn release(&mut self) {
        if self.decoder.take().is_some() {
            log::info!(
                "closed video {} after {} sampled frames",
                self.video_id,
                self.frames_emitted
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.release();
    }
}
