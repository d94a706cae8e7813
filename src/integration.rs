//! Integration of detection, tracking and the frame stream.
//!
//! This module provides the [`DetectionSource`] trait connecting any detector
//! to the centroid tracker, the contour-based detector used for motion masks,
//! the per-frame visitors and the [`VideoAnalysis`] consumer loop.

mod analysis;
mod annotate;
mod detector;
mod pipeline;

pub use analysis::{AnalysisError, AnalysisSummary, VideoAnalysis};
pub use annotate::Annotator;
pub use detector::{
    ContourDetector, DetectionError, DetectionSource, DetectorConfig, merge_boxes, polygon_area,
};
pub use pipeline::{FrameReport, FrameVisitor, ObjectTracker};
