//! VideoAnalysis: the consumer loop tying loader, transforms and visitors together.

use std::sync::Arc;

use crate::config::{ConfigError, CoreConfig};
use crate::tracker::{FinishedObject, TrackerError};
use crate::transform::{TransformError, TransformPipeline};
use crate::video::{DecoderBackend, LoaderError, LoaderState, StreamingLoader, VideoCollection};

use super::{Annotator, ContourDetector, DetectionSource, FrameReport, FrameVisitor, ObjectTracker};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of a completed [`VideoAnalysis::run`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    /// Frames that went through the pipeline
    pub frames: u64,
    /// Objects retired while the stream was running (already handed to the callback)
    pub retired: usize,
    /// Objects still active at end of stream, retired by the final flush
    pub flushed: Vec<FinishedObject>,
}

pub struct VideoAnalysis<D: DetectionSource = ContourDetector> {
    loader: StreamingLoader,
    pipeline: TransformPipeline,
    visitors: Vec<FrameVisitor<D>>,
    frames: u64,
}

impl VideoAnalysis<ContourDetector> {
    /// Loader, transforms, contour detector, tracker and (optionally) the
    /// annotator, all configured from one [`CoreConfig`].
    pub fn from_config(
        collection: VideoCollection,
        backend: Arc<dyn DecoderBackend>,
        config: &CoreConfig,
    ) -> Result<Self, AnalysisError> {
        let loader = StreamingLoader::new(collection, backend, config.loader.clone())?;
        let pipeline = config.build_pipeline()?;
        let detector = ContourDetector::new(config.detector.clone())?;

        let mut visitors = vec![FrameVisitor::Tracker(ObjectTracker::new(
            detector,
            config.tracker.clone(),
        ))];
        if config.annotate {
            let annotator = match &config.annotate_font {
                Some(path) => Annotator::from_font_file(path)?,
                None => Annotator::default(),
            };
            visitors.push(FrameVisitor::Annotator(annotator));
        }
        Ok(Self::new(loader, pipeline, visitors))
    }
}

impl<D: DetectionSource> VideoAnalysis<D> {
    pub fn new(
        loader: StreamingLoader,
        pipeline: TransformPipeline,
        visitors: Vec<FrameVisitor<D>>,
    ) -> Self {
        Self {
            loader,
            pipeline,
            visitors,
            frames: 0,
        }
    }

    /// Start the loader if it has not been started yet.
    pub fn start(&mut self) -> Result<(), AnalysisError> {
        if self.loader.state() == LoaderState::Idle {
            self.loader.start()?;
        }
        Ok(())
    }

    /// Whether the loader may still deliver frames.
    pub fn more(&self) -> bool {
        self.loader.more()
    }

    /// Process the next frame, if one arrives within the loader's read timeout.
    pub fn step(&mut self) -> Result<Option<FrameReport>, AnalysisError> {
        self.start()?;
        let Some(frame) = self.loader.read() else {
            return Ok(None);
        };

        let frame = self.pipeline.apply(frame)?;
        let mut report = FrameReport::new(&frame);
        for visitor in &mut self.visitors {
            visitor.apply(&frame, &mut report)?;
        }
        self.frames += 1;
        Ok(Some(report))
    }

    /// Drain the whole stream, handing each frame's report to `on_frame`.
    ///
    /// At end of stream the loader is stopped and every object still active
    /// is retired and returned in the summary.
    pub fn run<F>(&mut self, mut on_frame: F) -> Result<AnalysisSummary, AnalysisError>
    where
        F: FnMut(FrameReport),
    {
        self.start()?;
        let mut retired = 0;
        while self.loader.more() {
            if let Some(report) = self.step()? {
                retired += report.finished.len();
                on_frame(report);
            }
        }
        self.loader.stop();

        let flushed = self.finish();
        log::info!(
            "analysis finished: {} frames, {} objects retired, {} flushed at end of stream",
            self.frames,
            retired,
            flushed.len()
        );
        Ok(AnalysisSummary {
            frames: self.frames,
            retired,
            flushed,
        })
    }

    /// Retire every active object in every tracker.
    pub fn finish(&mut self) -> Vec<FinishedObject> {
        self.visitors
            .iter_mut()
            .flat_map(FrameVisitor::finish)
            .collect()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn loader(&self) -> &StreamingLoader {
        &self.loader
    }

    pub fn visitors(&self) -> &[FrameVisitor<D>] {
        &self.visitors
    }

    /// Stop the loader and take back the video collection.
    pub fn into_collection(self) -> Option<VideoCollection> {
        self.loader.into_collection()
    }
}
