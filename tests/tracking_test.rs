use camtrap_track::{
    BoundingBox, CentroidTracker, FinishedObject, FramePosition, ObjectState, TrackerConfig,
};

fn square(cx: i32, cy: i32) -> BoundingBox {
    BoundingBox::new(cx - 5, cy - 5, 10, 10)
}

fn at(video_id: u64, frame_no: u64) -> FramePosition {
    FramePosition::new(video_id, frame_no)
}

#[test]
fn test_basic_tracking() {
    let mut tracker = CentroidTracker::new(TrackerConfig::default());

    // Frame 1: one detection registers object 0
    let tracks1 = tracker.update(at(1, 0), &[square(100, 100)]).unwrap();
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].id;
    assert_eq!(id1, 0);

    // Frame 2: same object moved slightly
    let tracks2 = tracker.update(at(1, 10), &[square(105, 104)]).unwrap();
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].id, id1);
    assert_eq!(tracks2[0].centroid.x, 105);

    // Frame 3: nothing detected, the object is kept but counted as missing
    let tracks3 = tracker.update(at(1, 20), &[]).unwrap();
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].disappeared, 1);

    // Frame 4: it reappears and keeps its id
    let tracks4 = tracker.update(at(1, 30), &[square(110, 108)]).unwrap();
    assert_eq!(tracks4.len(), 1);
    assert_eq!(tracks4[0].id, id1);
    assert_eq!(tracks4[0].disappeared, 0);
}

#[test]
fn test_retired_after_exceeding_max_disappeared() {
    let mut tracker = CentroidTracker::new(TrackerConfig { max_disappeared: 2 });

    for frame_no in 1..=3 {
        tracker.update(at(1, frame_no), &[square(50, 50)]).unwrap();
    }

    // Two empty updates bring the count to 2, which is not yet above the limit
    tracker.update(at(1, 4), &[]).unwrap();
    tracker.update(at(1, 5), &[]).unwrap();
    assert_eq!(tracker.state_of(0), Some(ObjectState::Active));
    assert_eq!(tracker.disappeared_count(0), Some(2));

    // The third brings it to 3 > 2
    let active = tracker.update(at(1, 6), &[]).unwrap();
    assert!(active.is_empty());
    assert_eq!(tracker.state_of(0), Some(ObjectState::Finished));
    assert_eq!(tracker.disappeared_count(0), None);

    let finished = tracker.drain_finished();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].videos[0].frames, vec![1, 2, 3]);
}

#[test]
fn test_new_objects_registered_in_encounter_order() {
    let mut tracker = CentroidTracker::default();
    let tracks = tracker
        .update(at(1, 0), &[square(0, 0), square(100, 100)])
        .unwrap();

    assert_eq!(tracks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(tracks[0].centroid.x, 0);
    assert_eq!(tracks[1].centroid.x, 100);
    assert_eq!(tracker.next_id(), 2);
}

#[test]
fn test_identity_carries_across_videos() {
    let mut tracker = CentroidTracker::default();

    for (i, frame_no) in [0u64, 10, 20].into_iter().enumerate() {
        tracker
            .update(at(1, frame_no), &[square(200 + 5 * i as i32, 80)])
            .unwrap();
    }
    // First sampled frame of the next video, object barely moved
    let tracks = tracker.update(at(2, 0), &[square(212, 82)]).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 0);

    let active = tracker.get(0).unwrap();
    assert_eq!(active.video_ids().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(active.observation_count(), 4);

    tracker.finish_all();
    let finished = tracker.drain_finished();
    assert_eq!(finished.len(), 1);
    let object = &finished[0];
    assert_eq!(object.video_ids(), vec![1, 2]);
    assert_eq!(object.videos[0].frames, vec![0, 10, 20]);
    assert_eq!(object.videos[1].frames, vec![0]);
    assert_eq!(object.videos[1].centroids[0].x, 212);
    assert!(tracker.arena().is_empty());
}

#[test]
fn test_replacement_in_same_frame_inherits_identity() {
    // With as many boxes as objects nothing is registered or aged: a new
    // animal entering while another leaves takes over the leaver's id.
    let mut tracker = CentroidTracker::default();
    tracker
        .update(at(1, 0), &[square(10, 10), square(300, 300)])
        .unwrap();

    let tracks = tracker
        .update(at(1, 10), &[square(12, 10), square(600, 300)])
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].id, 1);
    assert_eq!((tracks[1].centroid.x, tracks[1].centroid.y), (600, 300));
    assert_eq!(tracks[1].disappeared, 0);
    assert_eq!(tracker.next_id(), 2);
}

/// Small deterministic generator so the sequence is reproducible without a dependency.
fn scripted_boxes(seed: u64, frames: usize) -> Vec<Vec<BoundingBox>> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as i32
    };
    (0..frames)
        .map(|_| {
            let count = next().rem_euclid(4) as usize;
            (0..count)
                .map(|_| square(next().rem_euclid(640), next().rem_euclid(480)))
                .collect()
        })
        .collect()
}

fn run(boxes: &[Vec<BoundingBox>]) -> (Vec<Vec<(u64, i32, i32)>>, Vec<FinishedObject>) {
    let mut tracker = CentroidTracker::new(TrackerConfig { max_disappeared: 3 });
    let mut snapshots = Vec::new();
    let mut finished = Vec::new();
    for (frame_no, frame_boxes) in boxes.iter().enumerate() {
        let tracks = tracker.update(at(1, frame_no as u64), frame_boxes).unwrap();
        snapshots.push(
            tracks
                .iter()
                .map(|t| (t.id, t.centroid.x, t.centroid.y))
                .collect(),
        );
        finished.extend(tracker.drain_finished());
    }
    tracker.finish_all();
    finished.extend(tracker.drain_finished());
    (snapshots, finished)
}

#[test]
fn test_assignment_is_deterministic() {
    let boxes = scripted_boxes(42, 200);
    let (first_snapshots, first_finished) = run(&boxes);
    let (second_snapshots, second_finished) = run(&boxes);
    assert_eq!(first_snapshots, second_snapshots);
    assert_eq!(first_finished, second_finished);

    // Ids are handed out without gaps and never reused
    let mut ids: Vec<u64> = first_finished.iter().map(|o| o.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..ids.len() as u64).collect::<Vec<_>>());
}
