//! Container decoding through FFmpeg.
//!
//! Frames are converted to 8-bit grayscale by the FFmpeg scaler so the
//! rest of the pipeline never sees another pixel format.

use std::path::Path;

use ffmpeg_next as ffmpeg;
use image::{DynamicImage, GrayImage};

use super::decoder::{DecodeError, VideoDecoder};

pub(crate) struct FfmpegDecoder {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    eof_sent: bool,
}

impl FfmpegDecoder {
    pub(crate) fn open(path: &Path) -> Result<Self, DecodeError> {
        ffmpeg::init()?;
        let open_error = |reason: String| DecodeError::Open {
            path: path.to_path_buf(),
            reason,
        };

        let input = ffmpeg::format::input(&path).map_err(|e| open_error(e.to_string()))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| open_error("file has no video track".to_string()))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())?;
        let decoder = context.decoder().video()?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::GRAY8,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )?;

        log::debug!(
            "opened {} ({}x{}) with ffmpeg",
            path.display(),
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            eof_sent: false,
        })
    }

    /// Pull the next decoded frame, feeding packets and finally draining the decoder.
    fn receive(&mut self) -> Result<Option<ffmpeg::frame::Video>, DecodeError> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            match receive_status(self.decoder.receive_frame(&mut decoded))? {
                Received::Frame => return Ok(Some(decoded)),
                Received::Drained => return Ok(None),
                Received::NeedsInput if self.eof_sent => return Ok(None),
                Received::NeedsInput => {}
            }
            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        self.input
            .packets()
            .find(|(stream, _)| stream.index() == stream_index)
            .map(|(_, packet)| packet)
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn read(&mut self) -> Result<Option<DynamicImage>, DecodeError> {
        let Some(decoded) = self.receive()? else {
            return Ok(None);
        };
        let mut gray = ffmpeg::frame::Video::empty();
        self.scaler.run(&decoded, &mut gray)?;
        Ok(Some(DynamicImage::ImageLuma8(frame_to_image(&gray)?)))
    }

    fn skip(&mut self) -> Result<bool, DecodeError> {
        Ok(self.receive()?.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Received {
    Frame,
    NeedsInput,
    Drained,
}

/// Only EAGAIN asks for another packet; any other failure ends the file.
fn receive_status(result: Result<(), ffmpeg::Error>) -> Result<Received, DecodeError> {
    match result {
        Ok(()) => Ok(Received::Frame),
        Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
            Ok(Received::NeedsInput)
        }
        Err(ffmpeg::Error::Eof) => Ok(Received::Drained),
        Err(e) => Err(e.into()),
    }
}

fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<GrayImage, DecodeError> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = width as usize;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let line = data
            .get(start..start + row_bytes)
            .ok_or_else(|| DecodeError::Frame("ffmpeg frame row is out of bounds".to_string()))?;
        pixels.extend_from_slice(line);
    }

    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| DecodeError::Frame("ffmpeg frame has inconsistent size".to_string()))
}
