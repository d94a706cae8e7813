//! Tracked object with its per-video observation history.

use serde::Serialize;

use crate::tracker::observation::{Observation, ObservationArena, ObservationId};
use crate::tracker::rect::{BoundingBox, Centroid};
use crate::tracker::track_state::ObjectState;
use crate::video::VideoId;

/// Unique, never reused object identifier.
pub type ObjectId = u64;

/// Observations of one object within a single video, as arena indices.
#[derive(Debug, Clone)]
struct VideoTrack {
    video_id: VideoId,
    observations: Vec<ObservationId>,
}

/// Single tracked object.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    id: ObjectId,
    state: ObjectState,
    /// Most recent observation
    last: Observation,
    /// Per-video history in first-seen order
    videos: Vec<VideoTrack>,
}

impl TrackedObject {
    /// Create an object from its first observation.
    pub(crate) fn new(id: ObjectId, first: Observation, arena: &mut ObservationArena) -> Self {
        let mut object = Self {
            id,
            state: ObjectState::Active,
            last: first,
            videos: Vec::new(),
        };
        object.record(first, arena);
        object
    }

    /// Append an observation, opening a new video entry on the first sighting
    /// in that video.
    pub(crate) fn record(&mut self, observation: Observation, arena: &mut ObservationArena) {
        let index = arena.insert(observation);
        self.last = observation;

        // Frames arrive in video order, so the video is almost always the last one.
        let position = match self.videos.last() {
            Some(track) if track.video_id == observation.video_id => Some(self.videos.len() - 1),
            _ => self
                .videos
                .iter()
                .position(|track| track.video_id == observation.video_id),
        };
        match position {
            Some(i) => self.videos[i].observations.push(index),
            None => self.videos.push(VideoTrack {
                video_id: observation.video_id,
                observations: vec![index],
            }),
        }
    }

    pub(crate) fn mark_finished(&mut self) {
        self.state = ObjectState::Finished;
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn centroid(&self) -> Centroid {
        self.last.centroid
    }

    pub fn bbox(&self) -> BoundingBox {
        self.last.bbox
    }

    pub fn last_observation(&self) -> &Observation {
        &self.last
    }

    /// Videos the object was seen in, in first-seen order.
    pub fn video_ids(&self) -> impl Iterator<Item = VideoId> + '_ {
        self.videos.iter().map(|track| track.video_id)
    }

    pub fn observation_count(&self) -> usize {
        self.videos.iter().map(|track| track.observations.len()).sum()
    }

    /// Resolve the full history against the arena it was recorded into.
    pub fn history<'a>(
        &'a self,
        arena: &'a ObservationArena,
    ) -> impl Iterator<Item = &'a Observation> + 'a {
        self.videos
            .iter()
            .flat_map(|track| track.observations.iter())
            .map(move |&index| arena.get(index))
    }

    /// Materialise the history and release the arena slots.
    pub(crate) fn into_finished(self, arena: &mut ObservationArena) -> FinishedObject {
        let videos = self
            .videos
            .into_iter()
            .map(|track| {
                let mut history = VideoHistory {
                    video_id: track.video_id,
                    frames: Vec::with_capacity(track.observations.len()),
                    bboxes: Vec::with_capacity(track.observations.len()),
                    centroids: Vec::with_capacity(track.observations.len()),
                };
                for index in track.observations {
                    let observation = arena.take(index);
                    history.frames.push(observation.frame_no);
                    history.bboxes.push(observation.bbox);
                    history.centroids.push(observation.centroid);
                }
                history
            })
            .collect();

        FinishedObject {
            id: self.id,
            videos,
        }
    }
}

/// A retired object handed over to the consumer for storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedObject {
    pub id: ObjectId,
    /// One entry per video the object was seen in, in first-seen order
    pub videos: Vec<VideoHistory>,
}

/// Everything recorded about one object within one video.
///
/// The three vectors are parallel: index `i` of each describes the same frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoHistory {
    pub video_id: VideoId,
    pub frames: Vec<u64>,
    pub bboxes: Vec<BoundingBox>,
    pub centroids: Vec<Centroid>,
}

impl FinishedObject {
    pub fn video_ids(&self) -> Vec<VideoId> {
        self.videos.iter().map(|v| v.video_id).collect()
    }

    pub fn observation_count(&self) -> usize {
        self.videos.iter().map(|v| v.frames.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(video_id: VideoId, frame_no: u64, x: i32) -> Observation {
        let bbox = BoundingBox::new(x, 10, 6, 6);
        Observation {
            video_id,
            frame_no,
            bbox,
            centroid: bbox.centroid(),
        }
    }

    #[test]
    fn test_history_groups_by_video() {
        let mut arena = ObservationArena::new();
        let mut object = TrackedObject::new(7, obs(1, 0, 0), &mut arena);
        object.record(obs(1, 10, 5), &mut arena);
        object.record(obs(2, 0, 10), &mut arena);

        assert_eq!(object.video_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(object.observation_count(), 3);
        assert_eq!(object.centroid(), Centroid::new(13, 13));
        let frames: Vec<u64> = object.history(&arena).map(|o| o.frame_no).collect();
        assert_eq!(frames, vec![0, 10, 0]);

        let finished = object.into_finished(&mut arena);
        assert_eq!(finished.id, 7);
        assert_eq!(finished.video_ids(), vec![1, 2]);
        assert_eq!(finished.videos[0].frames, vec![0, 10]);
        assert_eq!(finished.videos[1].centroids, vec![Centroid::new(13, 13)]);
        assert!(arena.is_empty());
    }
}
