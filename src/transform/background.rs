//! Running-average background subtraction.

use image::{GrayImage, Luma};
use imageproc::map::map_colors2;
use serde::{Deserialize, Serialize};

use super::{ImageTransform, TransformError, check_image};

/// What the subtractor returns for each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskOutput {
    /// Binary foreground mask (255 = foreground)
    #[default]
    Mask,
    /// The input with background pixels set to 0
    Masked,
}

/// Keeps a per-pixel running average of the scene and marks pixels that differ
/// from it by more than `threshold` as foreground.
///
/// With no explicit learning rate the model averages over the frames seen so
/// far until `history` frames have passed, then settles at `1 / history`.
#[derive(Debug, Clone)]
pub struct BackgroundSubtractor {
    threshold: u8,
    history: u32,
    learning_rate: Option<f32>,
    output: MaskOutput,
    model: Vec<f32>,
    dimensions: (u32, u32),
    frames_seen: u32,
}

impl BackgroundSubtractor {
    pub fn new(threshold: u8, history: u32, learning_rate: Option<f32>, output: MaskOutput) -> Self {
        Self {
            threshold,
            history: history.max(1),
            learning_rate,
            output,
            model: Vec::new(),
            dimensions: (0, 0),
            frames_seen: 0,
        }
    }

    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    /// Forget the background model; the next frame starts a new one.
    pub fn reset(&mut self) {
        self.model.clear();
        self.dimensions = (0, 0);
        self.frames_seen = 0;
    }

    fn rate(&self) -> f32 {
        match self.learning_rate {
            Some(rate) => rate,
            None => {
                let averaging = 1.0 / (self.frames_seen as f32 + 1.0);
                averaging.max(1.0 / self.history as f32)
            }
        }
    }
}

impl ImageTransform for BackgroundSubtractor {
    fn name(&self) -> &'static str {
        "background_subtraction"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;

        if image.dimensions() != self.dimensions {
            if self.frames_seen > 0 {
                log::debug!(
                    "frame size changed {:?} -> {:?}, resetting background model",
                    self.dimensions,
                    image.dimensions()
                );
            }
            self.reset();
            self.dimensions = image.dimensions();
            self.model = image.as_raw().iter().map(|&p| f32::from(p)).collect();
            self.frames_seen = 1;
            return Ok(GrayImage::new(image.width(), image.height()));
        }

        let rate = self.rate();
        let threshold = f32::from(self.threshold);
        let mut mask = GrayImage::new(image.width(), image.height());
        for ((background, &pixel), out) in self
            .model
            .iter_mut()
            .zip(image.as_raw().iter())
            .zip(mask.iter_mut())
        {
            let value = f32::from(pixel);
            if (value - *background).abs() > threshold {
                *out = 255;
            }
            *background += rate * (value - *background);
        }
        self.frames_seen = self.frames_seen.saturating_add(1);

        Ok(match self.output {
            MaskOutput::Mask => mask,
            MaskOutput::Masked => map_colors2(image, &mask, |Luma([p]), Luma([m])| {
                Luma([if m > 0 { p } else { 0 }])
            }),
        })
    }
}
