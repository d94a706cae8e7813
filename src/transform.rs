//! Image transforms applied to each frame before detection.
//!
//! Every transform reads the most recent image of a [`Frame`](crate::video::Frame)
//! and appends its output, so later stages (and the annotator) can still reach
//! the original.

mod background;
mod filters;
mod pipeline;
mod spec;

pub use background::{BackgroundSubtractor, MaskOutput};
pub use filters::{
    Canny, Dilate, EqualizeHistogram, Gamma, GaussianBlur, MedianBlur, Normalize, OtsuThreshold,
    Resize, Threshold, ThresholdMode,
};
pub use pipeline::TransformPipeline;
pub use spec::{MAX_RESIZE_PERCENT, TransformSpec};

use image::GrayImage;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{transform}: invalid input image of size {width}x{height}")]
    InvalidImage {
        transform: &'static str,
        width: u32,
        height: u32,
    },
}

/// A single image-to-image step.
pub trait ImageTransform {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError>;
}

/// Reject images no transform can work on.
pub(crate) fn check_image(transform: &'static str, image: &GrayImage) -> Result<(), TransformError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidImage {
            transform,
            width,
            height,
        });
    }
    Ok(())
}
