//! Centroid tracker: frame-to-frame identity assignment and object lifecycle.

use std::collections::BTreeMap;

use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::observation::{Observation, ObservationArena};
use crate::tracker::rect::{BoundingBox, Centroid};
use crate::tracker::track_state::ObjectState;
use crate::tracker::tracked_object::{FinishedObject, ObjectId, TrackedObject};
use crate::tracker::TrackerError;
use crate::video::VideoId;

/// Configuration for the CentroidTracker.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// An object is retired once its disappeared-count is strictly greater than this.
    pub max_disappeared: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { max_disappeared: 50 }
    }
}

/// Where the boxes handed to [`CentroidTracker::update`] were observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePosition {
    pub video_id: VideoId,
    pub frame_no: u64,
}

impl FramePosition {
    pub fn new(video_id: VideoId, frame_no: u64) -> Self {
        Self { video_id, frame_no }
    }
}

/// Snapshot of an active object after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTrack {
    pub id: ObjectId,
    pub bbox: BoundingBox,
    pub centroid: Centroid,
    /// Consecutive updates this object went unmatched
    pub disappeared: u32,
}

pub struct CentroidTracker {
    next_id: ObjectId,
    active: BTreeMap<ObjectId, TrackedObject>,
    disappeared: BTreeMap<ObjectId, u32>,
    finished: BTreeMap<ObjectId, TrackedObject>,
    arena: ObservationArena,
    config: TrackerConfig,
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            next_id: 0,
            active: BTreeMap::new(),
            disappeared: BTreeMap::new(),
            finished: BTreeMap::new(),
            arena: ObservationArena::new(),
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Feed one frame's (already merged) boxes and return the active objects.
    ///
    /// Active objects are kept in registration order, which together with the
    /// stable greedy matching makes the id assignment a pure function of the
    /// input sequence.
    pub fn update(
        &mut self,
        position: FramePosition,
        boxes: &[BoundingBox],
    ) -> Result<Vec<ActiveTrack>, TrackerError> {
        // Step 1: Nothing detected, every active object disappears for one more frame
        if boxes.is_empty() {
            let ids: Vec<ObjectId> = self.active.keys().copied().collect();
            for id in ids {
                self.mark_disappeared(id)?;
            }
            return self.snapshot();
        }

        // Step 2: Centroids of the input boxes
        let input_centroids: Vec<Centroid> = boxes.iter().map(BoundingBox::centroid).collect();

        // Step 3: Empty registry, everything is new
        if self.active.is_empty() {
            for bbox in boxes {
                self.register(position, *bbox);
            }
            return self.snapshot();
        }

        // Step 4: Associate existing objects with input centroids
        let object_ids: Vec<ObjectId> = self.active.keys().copied().collect();
        let object_centroids: Vec<Centroid> =
            self.active.values().map(TrackedObject::centroid).collect();

        let dists = matching::distance_matrix(&object_centroids, &input_centroids);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::greedy_assignment(&dists, object_ids.len(), boxes.len())?;

        for (row, col) in matches {
            let id = object_ids[row];
            let observation = Self::observation(position, boxes[col]);
            let object = self
                .active
                .get_mut(&id)
                .ok_or(TrackerError::UnknownObject(id))?;
            object.record(observation, &mut self.arena);
            *self
                .disappeared
                .get_mut(&id)
                .ok_or(TrackerError::MissingDisappearedCount(id))? = 0;
        }

        // Step 5: Either age the unmatched objects or register the unmatched boxes,
        // never both in the same update.
        if object_ids.len() >= boxes.len() {
            for row in unmatched_tracks {
                self.mark_disappeared(object_ids[row])?;
            }
        } else {
            for col in unmatched_detections {
                self.register(position, boxes[col]);
            }
        }

        self.snapshot()
    }

    /// Retire every active object, typically once the stream has ended.
    pub fn finish_all(&mut self) {
        let ids: Vec<ObjectId> = self.active.keys().copied().collect();
        for id in ids {
            self.deregister(id);
        }
    }

    /// Hand the finished objects over to the caller, oldest id first.
    pub fn drain_finished(&mut self) -> Vec<FinishedObject> {
        let finished = std::mem::take(&mut self.finished);
        finished
            .into_values()
            .map(|object| object.into_finished(&mut self.arena))
            .collect()
    }

    /// Active objects in registration order.
    pub fn active(&self) -> impl Iterator<Item = &TrackedObject> {
        self.active.values()
    }

    /// Finished objects not yet drained.
    pub fn finished(&self) -> impl Iterator<Item = &TrackedObject> {
        self.finished.values()
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.active.get(&id).or_else(|| self.finished.get(&id))
    }

    pub fn state_of(&self, id: ObjectId) -> Option<ObjectState> {
        self.get(id).map(TrackedObject::state)
    }

    pub fn disappeared_count(&self, id: ObjectId) -> Option<u32> {
        self.disappeared.get(&id).copied()
    }

    /// The id the next registered object will receive.
    pub fn next_id(&self) -> ObjectId {
        self.next_id
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn finished_len(&self) -> usize {
        self.finished.len()
    }

    /// Observation records currently held by the tracker.
    pub fn arena(&self) -> &ObservationArena {
        &self.arena
    }

    fn observation(position: FramePosition, bbox: BoundingBox) -> Observation {
        Observation {
            video_id: position.video_id,
            frame_no: position.frame_no,
            bbox,
            centroid: bbox.centroid(),
        }
    }

    fn register(&mut self, position: FramePosition, bbox: BoundingBox) {
        let id = self.next_id;
        self.next_id += 1;

        let object = TrackedObject::new(id, Self::observation(position, bbox), &mut self.arena);
        log::debug!(
            "registered object {} in video {} at frame {}",
            id,
            position.video_id,
            position.frame_no
        );
        self.active.insert(id, object);
        self.disappeared.insert(id, 0);
    }

    fn mark_disappeared(&mut self, id: ObjectId) -> Result<(), TrackerError> {
        let count = self
            .disappeared
            .get_mut(&id)
            .ok_or(TrackerError::MissingDisappearedCount(id))?;
        *count += 1;
        if *count > self.config.max_disappeared {
            self.deregister(id);
        }
        Ok(())
    }

    fn deregister(&mut self, id: ObjectId) {
        self.disappeared.remove(&id);
        if let Some(mut object) = self.active.remove(&id) {
            object.mark_finished();
            log::debug!(
                "object {} finished after {} observations",
                id,
                object.observation_count()
            );
            self.finished.insert(id, object);
        }
    }

    fn snapshot(&self) -> Result<Vec<ActiveTrack>, TrackerError> {
        self.active
            .values()
            .map(|object| {
                let disappeared = self
                    .disappeared
                    .get(&object.id())
                    .copied()
                    .ok_or(TrackerError::MissingDisappearedCount(object.id()))?;
                Ok(ActiveTrack {
                    id: object.id(),
                    bbox: object.bbox(),
                    centroid: object.centroid(),
                    disappeared,
                })
            })
            .collect()
    }
}
