//! Per-frame visitors: the object tracker and the annotator.

use image::GrayImage;

use crate::tracker::{
    ActiveTrack, BoundingBox, CentroidTracker, FinishedObject, FramePosition, TrackerConfig,
};
use crate::video::{Frame, VideoId};

use super::{AnalysisError, Annotator, ContourDetector, DetectionSource};

/// Everything the visitors produced for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub video_id: VideoId,
    pub frame_no: u64,
    /// Boxes handed to the tracker, after merging
    pub detections: Vec<BoundingBox>,
    /// Active objects after this frame's update
    pub active: Vec<ActiveTrack>,
    /// Objects retired by this frame's update
    pub finished: Vec<FinishedObject>,
    pub annotated: Option<GrayImage>,
}

impl FrameReport {
    pub fn new(frame: &Frame) -> Self {
        Self {
            video_id: frame.video_id(),
            frame_no: frame.frame_no(),
            ..Self::default()
        }
    }
}

/// Detection bundled with the centroid tracker.
pub struct ObjectTracker<D: DetectionSource = ContourDetector> {
    detector: D,
    tracker: CentroidTracker,
}

impl<D: DetectionSource> ObjectTracker<D> {
    /// Create a new object tracker from a detector and tracker configuration.
    pub fn new(detector: D, config: TrackerConfig) -> Self {
        Self {
            detector,
            tracker: CentroidTracker::new(config),
        }
    }

    /// Create a new object tracker with default tracker configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }

    /// Detect on the frame's most processed image, update the tracker and
    /// collect whatever it retired.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        report: &mut FrameReport,
    ) -> Result<(), AnalysisError> {
        let detections = self
            .detector
            .detect(frame.last())
            .map_err(|e| AnalysisError::Detection(Box::new(e)))?;

        let position = FramePosition::new(frame.video_id(), frame.frame_no());
        report.active = self.tracker.update(position, &detections)?;
        report.detections = detections;
        report.finished.extend(self.tracker.drain_finished());
        Ok(())
    }

    /// Retire every active object and hand all finished objects over.
    pub fn finish(&mut self) -> Vec<FinishedObject> {
        self.tracker.finish_all();
        self.tracker.drain_finished()
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying centroid tracker.
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying centroid tracker.
    pub fn tracker_mut(&mut self) -> &mut CentroidTracker {
        &mut self.tracker
    }
}

/// The closed set of per-frame visitors, run in order on every frame.
pub enum FrameVisitor<D: DetectionSource = ContourDetector> {
    Tracker(ObjectTracker<D>),
    Annotator(Annotator),
}

impl<D: DetectionSource> FrameVisitor<D> {
    pub fn apply(&mut self, frame: &Frame, report: &mut FrameReport) -> Result<(), AnalysisError> {
        match self {
            FrameVisitor::Tracker(tracker) => tracker.process_frame(frame, report),
            FrameVisitor::Annotator(annotator) => {
                report.annotated = Some(annotator.draw(frame.original(), &report.active));
                Ok(())
            }
        }
    }

    /// End-of-stream flush; only the tracker holds objects.
    pub fn finish(&mut self) -> Vec<FinishedObject> {
        match self {
            FrameVisitor::Tracker(tracker) => tracker.finish(),
            FrameVisitor::Annotator(_) => Vec::new(),
        }
    }
}
