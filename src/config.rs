//! Core configuration, read from a TOML file.
//!
//! Every section is optional; missing values fall back to the defaults of
//! the component they configure.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::integration::DetectorConfig;
use crate::tracker::TrackerConfig;
use crate::transform::{MaskOutput, ThresholdMode, TransformPipeline, TransformSpec};
use crate::video::LoaderConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Draw active tracks onto each frame's original image
    pub annotate: bool,
    /// Font for object id labels on annotated frames; ids are omitted without one
    pub annotate_font: Option<PathBuf>,
    pub loader: LoaderConfig,
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    /// Applied in order to every frame before detection
    pub transforms: Vec<TransformSpec>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            annotate: false,
            annotate_font: None,
            loader: LoaderConfig::default(),
            detector: DetectorConfig::default(),
            tracker: TrackerConfig::default(),
            transforms: default_transforms(),
        }
    }
}

/// Background subtraction followed by noise removal and binarisation, so the
/// detector sees one solid blob per moving animal.
fn default_transforms() -> Vec<TransformSpec> {
    vec![
        TransformSpec::BackgroundSubtraction {
            threshold: 25,
            history: 250,
            learning_rate: None,
            output: MaskOutput::Mask,
        },
        TransformSpec::MedianBlur { radius: 2 },
        TransformSpec::Threshold {
            level: 127,
            mode: ThresholdMode::Binary,
        },
        TransformSpec::Dilate { radius: 2 },
    ]
}

impl CoreConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, including that each transform can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loader.validate()?;
        self.detector.validate()?;
        for spec in &self.transforms {
            spec.build()?;
        }
        Ok(())
    }

    pub fn build_pipeline(&self) -> Result<TransformPipeline, ConfigError> {
        TransformPipeline::from_specs(&self.transforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.loader.skip_n_frames, 9);
        assert_eq!(config.loader.queue_size, 500);
        assert_eq!(config.tracker.max_disappeared, 50);
        assert_eq!(config.detector.min_contour_area, 50.0);
        assert_eq!(config.build_pipeline().unwrap().len(), 4);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
            annotate = true
            annotate_font = "fonts/label.ttf"

            [loader]
            skip_n_frames = 0

            [tracker]
            max_disappeared = 2

            [[transforms]]
            kind = "otsu_threshold"
            "#,
        )
        .unwrap();

        assert!(config.annotate);
        assert_eq!(config.annotate_font, Some(PathBuf::from("fonts/label.ttf")));
        assert_eq!(config.loader.skip_n_frames, 0);
        assert_eq!(config.loader.queue_size, 500);
        assert_eq!(config.tracker.max_disappeared, 2);
        assert_eq!(config.transforms, vec![TransformSpec::OtsuThreshold]);
        assert_eq!(config.build_pipeline().unwrap().names(), vec!["otsu_threshold"]);
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        for text in [
            "[loader]\nqueue_size = 0",
            "[loader]\nread_timeout_ms = 0",
            "[detector]\nmerge_eps = -1.0",
            "[[transforms]]\nkind = \"gamma\"\ngamma = 0.0",
        ] {
            let err = CoreConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn test_negative_integers_are_parse_errors() {
        let err = CoreConfig::from_toml_str("[loader]\nskip_n_frames = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[detector]\nmin_contour_area = 10.0").unwrap();
        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.detector.min_contour_area, 10.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CoreConfig::load("/no/such/core.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
