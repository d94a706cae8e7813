mod centroid_tracker;
mod matching;
mod observation;
mod rect;
mod track_state;
mod tracked_object;

pub use centroid_tracker::{ActiveTrack, CentroidTracker, FramePosition, TrackerConfig};
pub use matching::{AssignmentResult, distance_matrix, greedy_assignment};
pub use observation::{Observation, ObservationArena, ObservationId};
pub use rect::{BoundingBox, Centroid};
pub use track_state::ObjectState;
pub use tracked_object::{FinishedObject, ObjectId, TrackedObject, VideoHistory};

/// Tracker invariant violations. These indicate a programming error, never bad input.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("distance matrix is {got:?}, expected {expected:?} (objects x boxes)")]
    DistanceMatrixShape {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("active object {0} has no disappeared-count entry")]
    MissingDisappearedCount(ObjectId),
    #[error("object {0} is not in the active registry")]
    UnknownObject(ObjectId),
}
