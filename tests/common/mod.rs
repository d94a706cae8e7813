//! Scripted in-memory decoding backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use camtrap_track::video::DecodeError;
use camtrap_track::{DecoderBackend, VideoCollection, VideoDecoder, VideoDescriptor, VideoId};
use chrono::{NaiveDate, NaiveTime};
use image::{DynamicImage, GrayImage, Luma};

/// Pixel value of frame `index` in every scripted image.
pub fn pixel_for(index: u64) -> u8 {
    (index % 256) as u8
}

/// How a scripted video behaves.
#[derive(Debug, Clone)]
pub enum Script {
    /// Frames whose pixels carry their index
    Frames(u64),
    /// Custom images, one per frame
    Images(Vec<GrayImage>),
    /// Opening fails
    Unreadable,
    /// Decoding fails at the given frame index
    FailAt { frames: u64, fail_at: u64 },
}

#[derive(Default)]
pub struct ScriptedBackend {
    scripts: HashMap<VideoId, Script>,
    open_handles: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, video_id: VideoId, script: Script) -> Self {
        self.scripts.insert(video_id, script);
        self
    }

    /// Decoders currently alive.
    pub fn open_handles(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_handles)
    }

    /// Decoders ever opened.
    pub fn opened(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opened)
    }
}

impl DecoderBackend for ScriptedBackend {
    fn open(&self, video: &VideoDescriptor) -> Result<Box<dyn VideoDecoder>, DecodeError> {
        let unreadable = || DecodeError::Open {
            path: video.path().to_path_buf(),
            reason: "scripted as unreadable".to_string(),
        };
        let script = self.scripts.get(&video.id()).ok_or_else(unreadable)?;
        let (images, frames, fail_at) = match script {
            Script::Unreadable => return Err(unreadable()),
            Script::Frames(frames) => (Vec::new(), *frames, None),
            Script::Images(images) => (images.clone(), images.len() as u64, None),
            Script::FailAt { frames, fail_at } => (Vec::new(), *frames, Some(*fail_at)),
        };

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDecoder {
            images,
            index: 0,
            frames,
            fail_at,
            handles: Arc::clone(&self.open_handles),
        }))
    }
}

struct ScriptedDecoder {
    images: Vec<GrayImage>,
    index: u64,
    frames: u64,
    fail_at: Option<u64>,
    handles: Arc<AtomicUsize>,
}

impl VideoDecoder for ScriptedDecoder {
    fn read(&mut self) -> Result<Option<DynamicImage>, DecodeError> {
        if Some(self.index) == self.fail_at {
            return Err(DecodeError::Frame("scripted failure".to_string()));
        }
        if self.index >= self.frames {
            return Ok(None);
        }
        let image = match self.images.get(self.index as usize) {
            Some(image) => image.clone(),
            None => GrayImage::from_pixel(8, 8, Luma([pixel_for(self.index)])),
        };
        self.index += 1;
        Ok(Some(DynamicImage::ImageLuma8(image)))
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Descriptor for a scripted video recorded at the given hour of 2021-06-01.
pub fn video(id: VideoId, hour: u32) -> VideoDescriptor {
    VideoDescriptor::new(
        id,
        format!("scripted/{id}.mkv"),
        NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
    )
}

pub fn collection(videos: Vec<VideoDescriptor>) -> VideoCollection {
    VideoCollection::new(videos)
}
