//! Decoder traits and the built-in decoding backends.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::DynamicImage;

#[cfg(feature = "ffmpeg")]
use super::ffmpeg::FfmpegDecoder;
use super::VideoDescriptor;

/// Failure to open a video or decode a frame from it.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot open '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("frame decode failed: {0}")]
    Frame(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "ffmpeg")]
    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// A single open video, read front to back.
///
/// Decoders are created and dropped on the loader's worker thread; dropping
/// one releases the underlying handle.
pub trait VideoDecoder {
    /// Decode the next frame, `Ok(None)` at end of stream.
    fn read(&mut self) -> Result<Option<DynamicImage>, DecodeError>;

    /// Advance past the next frame without converting it; `Ok(false)` at end of stream.
    fn skip(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read()?.is_some())
    }
}

/// Opens decoders for video descriptors.
pub trait DecoderBackend: Send + Sync {
    fn open(&self, video: &VideoDescriptor) -> Result<Box<dyn VideoDecoder>, DecodeError>;
}

const SEQUENCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Decodes a directory of still images as a video, in file-name order.
pub struct ImageSequenceDecoder {
    files: VecDeque<PathBuf>,
}

impl ImageSequenceDecoder {
    pub fn open(dir: &Path) -> Result<Self, DecodeError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SEQUENCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(DecodeError::Open {
                path: dir.to_path_buf(),
                reason: "directory contains no image files".to_string(),
            });
        }
        files.sort();
        Ok(Self {
            files: files.into(),
        })
    }

    /// Frames left to decode.
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl VideoDecoder for ImageSequenceDecoder {
    fn read(&mut self) -> Result<Option<DynamicImage>, DecodeError> {
        match self.files.pop_front() {
            Some(path) => Ok(Some(image::open(&path)?)),
            None => Ok(None),
        }
    }

    fn skip(&mut self) -> Result<bool, DecodeError> {
        Ok(self.files.pop_front().is_some())
    }
}

/// Picks a decoder by path: directories are image sequences, files go to FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBackend;

impl DecoderBackend for DefaultBackend {
    fn open(&self, video: &VideoDescriptor) -> Result<Box<dyn VideoDecoder>, DecodeError> {
        let path = video.path();
        if path.is_dir() {
            return Ok(Box::new(ImageSequenceDecoder::open(path)?));
        }
        if !path.exists() {
            return Err(DecodeError::Open {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }

        #[cfg(feature = "ffmpeg")]
        {
            Ok(Box::new(FfmpegDecoder::open(path)?))
        }
        #[cfg(not(feature = "ffmpeg"))]
        {
            Err(DecodeError::Open {
                path: path.to_path_buf(),
                reason: "video file decoding requires the `ffmpeg` feature".to_string(),
            })
        }
    }
}
