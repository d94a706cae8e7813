//! Arena of per-frame observation records.
//!
//! Tracked objects keep indices into the arena instead of owning their own
//! record vectors. Slots released when a finished object is drained are
//! reused by later observations, so a long session settles at a steady
//! allocation size.

use crate::tracker::rect::{BoundingBox, Centroid};
use crate::video::VideoId;

/// One sighting of an object: where it was and in which frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub video_id: VideoId,
    pub frame_no: u64,
    pub bbox: BoundingBox,
    pub centroid: Centroid,
}

/// Index of an [`Observation`] inside an [`ObservationArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(usize);

#[derive(Debug, Default)]
pub struct ObservationArena {
    slots: Vec<Observation>,
    free: Vec<usize>,
}

impl ObservationArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observation: Observation) -> ObservationId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = observation;
                ObservationId(index)
            }
            None => {
                self.slots.push(observation);
                ObservationId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: ObservationId) -> &Observation {
        &self.slots[id.0]
    }

    /// Copy the record out and hand its slot back for reuse.
    pub fn take(&mut self, id: ObservationId) -> Observation {
        self.free.push(id.0);
        self.slots[id.0]
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
