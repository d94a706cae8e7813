use image::GrayImage;

use super::VideoId;

/// A decoded frame plus every image derived from it by the transform pipeline.
///
/// Index 0 is always the original (grayscale) frame; each transform appends
/// one image. The tracker only ever reads a frame.
#[derive(Debug, Clone)]
pub struct Frame {
    video_id: VideoId,
    frame_no: u64,
    images: Vec<GrayImage>,
}

impl Frame {
    pub fn new(video_id: VideoId, frame_no: u64, original: GrayImage) -> Self {
        Self {
            video_id,
            frame_no,
            images: vec![original],
        }
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    /// Index of the frame within its video, counting skipped frames.
    pub fn frame_no(&self) -> u64 {
        self.frame_no
    }

    pub fn original(&self) -> &GrayImage {
        &self.images[0]
    }

    /// Most recently appended image (the original if no transform ran yet).
    pub fn last(&self) -> &GrayImage {
        // `images` is never empty, it is created with the original.
        &self.images[self.images.len() - 1]
    }

    pub fn push(&mut self, image: GrayImage) {
        self.images.push(image);
    }

    pub fn images(&self) -> &[GrayImage] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&GrayImage> {
        self.images.get(index)
    }

    /// Number of images, including the original.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}
