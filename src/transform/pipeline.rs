//! TransformPipeline: an ordered chain of transforms applied to every frame.

use super::{ImageTransform, TransformError, TransformSpec};
use crate::config::ConfigError;
use crate::video::Frame;

#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn ImageTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every spec in order, failing on the first invalid one.
    pub fn from_specs(specs: &[TransformSpec]) -> Result<Self, ConfigError> {
        let transforms = specs
            .iter()
            .map(TransformSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { transforms })
    }

    /// Append a transform to the end of the chain.
    pub fn with(mut self, transform: impl ImageTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn push(&mut self, transform: Box<dyn ImageTransform>) {
        self.transforms.push(transform);
    }

    /// Run each transform on the frame's latest image and append its output.
    pub fn apply(&mut self, mut frame: Frame) -> Result<Frame, TransformError> {
        for transform in &mut self.transforms {
            let output = transform.transform(frame.last())?;
            frame.push(output);
        }
        Ok(frame)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("transforms", &self.names())
            .finish()
    }
}
