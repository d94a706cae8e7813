//! Motion tracking for camera-trap videos.
//!
//! Videos are streamed in chronological order by a background loader, each
//! sampled frame runs through a chain of image transforms, contours of the
//! resulting foreground mask become bounding boxes, and a centroid tracker
//! follows every object across frames and videos until it disappears.

pub mod config;
pub mod integration;
pub mod tracker;
pub mod transform;
pub mod video;

pub use config::{ConfigError, CoreConfig};
pub use integration::{
    AnalysisError, AnalysisSummary, ContourDetector, DetectionSource, FrameReport, FrameVisitor,
    ObjectTracker, VideoAnalysis,
};
pub use tracker::{
    ActiveTrack, BoundingBox, Centroid, CentroidTracker, FinishedObject, FramePosition, ObjectId,
    ObjectState, TrackerConfig, TrackerError, VideoHistory,
};
pub use transform::{ImageTransform, TransformError, TransformPipeline, TransformSpec};
pub use video::{
    DecodeError, DecoderBackend, DefaultBackend, Frame, LoaderConfig, LoaderError, LoaderState,
    StreamingLoader, VideoCollection, VideoDecoder, VideoDescriptor, VideoId,
};
