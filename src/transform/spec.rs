use serde::{Deserialize, Serialize};

use super::{
    BackgroundSubtractor, Canny, Dilate, EqualizeHistogram, Gamma, GaussianBlur, ImageTransform,
    MaskOutput, MedianBlur, Normalize, OtsuThreshold, Resize, Threshold, ThresholdMode,
};
use crate::config::ConfigError;

/// Declarative description of one transform, as found in `[[transforms]]`
/// tables of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    BackgroundSubtraction {
        #[serde(default = "default_bgs_threshold")]
        threshold: u8,
        #[serde(default = "default_history")]
        history: u32,
        #[serde(default)]
        learning_rate: Option<f32>,
        #[serde(default)]
        output: MaskOutput,
    },
    Threshold {
        level: u8,
        #[serde(rename = "type", default)]
        mode: ThresholdMode,
    },
    OtsuThreshold,
    GaussianBlur {
        sigma: f32,
    },
    MedianBlur {
        radius: u32,
    },
    EqualizeHistogram,
    Gamma {
        gamma: f32,
    },
    Normalize,
    Canny {
        low: f32,
        high: f32,
    },
    Dilate {
        radius: u8,
    },
    Resize {
        percent: u32,
    },
}

fn default_bgs_threshold() -> u8 {
    25
}

fn default_history() -> u32 {
    250
}

/// Largest upscale a resize step accepts, in percent.
pub const MAX_RESIZE_PERCENT: u32 = 1000;

fn positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be a finite number greater than 0, got {value}"),
        ))
    }
}

impl TransformSpec {
    /// Validate the parameters and construct the transform.
    pub fn build(&self) -> Result<Box<dyn ImageTransform>, ConfigError> {
        let transform: Box<dyn ImageTransform> = match *self {
            TransformSpec::BackgroundSubtraction {
                threshold,
                history,
                learning_rate,
                output,
            } => {
                if history == 0 {
                    return Err(ConfigError::invalid(
                        "transforms.history",
                        "must be greater than 0",
                    ));
                }
                if let Some(rate) = learning_rate.filter(|rate| !(0.0..=1.0).contains(rate)) {
                    return Err(ConfigError::invalid(
                        "transforms.learning_rate",
                        format!("must be within 0..=1, got {rate}"),
                    ));
                }
                Box::new(BackgroundSubtractor::new(
                    threshold,
                    history,
                    learning_rate,
                    output,
                ))
            }
            TransformSpec::Threshold { level, mode } => Box::new(Threshold { level, mode }),
            TransformSpec::OtsuThreshold => Box::new(OtsuThreshold),
            TransformSpec::GaussianBlur { sigma } => {
                Box::new(GaussianBlur::new(positive("transforms.sigma", sigma)?))
            }
            TransformSpec::MedianBlur { radius } => Box::new(MedianBlur { radius }),
            TransformSpec::EqualizeHistogram => Box::new(EqualizeHistogram),
            TransformSpec::Gamma { gamma } => Box::new(Gamma::new(positive("transforms.gamma", gamma)?)),
            TransformSpec::Normalize => Box::new(Normalize),
            TransformSpec::Canny { low, high } => {
                if !(low.is_finite() && high.is_finite() && 0.0 <= low && low <= high) {
                    return Err(ConfigError::invalid(
                        "transforms.low",
                        format!("need 0 <= low <= high, got low={low} high={high}"),
                    ));
                }
                Box::new(Canny::new(low, high))
            }
            TransformSpec::Dilate { radius } => Box::new(Dilate { radius }),
            TransformSpec::Resize { percent } => {
                if !(1..=MAX_RESIZE_PERCENT).contains(&percent) {
                    return Err(ConfigError::invalid(
                        "transforms.percent",
                        format!("must be within 1..={MAX_RESIZE_PERCENT}, got {percent}"),
                    ));
                }
                Box::new(Resize::new(percent))
            }
        };
        Ok(transform)
    }
}
