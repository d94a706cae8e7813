//! Video descriptors and the chronologically ordered collection the loader walks.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::VideoId;

/// One video file as supplied by the project catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    id: VideoId,
    path: PathBuf,
    date: NaiveDate,
    time: NaiveTime,
    /// Frames per second as reported by the container
    #[serde(default)]
    fps: Option<f32>,
    /// Duration in seconds
    #[serde(default)]
    duration: Option<f64>,
}

impl VideoDescriptor {
    pub fn new(id: VideoId, path: impl Into<PathBuf>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            id,
            path: path.into(),
            date,
            time,
            fps: None,
            duration: None,
        }
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn id(&self) -> VideoId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Capture moment used to order a collection.
    pub fn ordering_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }
}

/// Videos in non-decreasing (date, time) order plus a forward-only cursor.
#[derive(Debug, Clone, Default)]
pub struct VideoCollection {
    videos: Vec<VideoDescriptor>,
    cursor: usize,
}

impl VideoCollection {
    /// Build a collection; descriptors are sorted by capture moment, ties keep
    /// their given order.
    pub fn new(mut videos: Vec<VideoDescriptor>) -> Self {
        videos.sort_by_key(VideoDescriptor::ordering_key);
        Self { videos, cursor: 0 }
    }

    /// Next unprocessed video, moving the cursor past it.
    pub fn advance(&mut self) -> Option<&VideoDescriptor> {
        let video = self.videos.get(self.cursor)?;
        self.cursor += 1;
        Some(video)
    }

    /// Rewind the cursor so the collection can be streamed again.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Number of videos not yet handed out by [`advance`](Self::advance).
    pub fn remaining(&self) -> usize {
        self.videos.len() - self.cursor
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoDescriptor> {
        self.videos.iter()
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

impl FromIterator<VideoDescriptor> for VideoCollection {
    fn from_iter<I: IntoIterator<Item = VideoDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: VideoId, day: u32, hour: u32) -> VideoDescriptor {
        VideoDescriptor::new(
            id,
            format!("/data/{id}.mkv"),
            NaiveDate::from_ymd_opt(2021, 6, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_sorted_by_date_then_time() {
        let collection = VideoCollection::new(vec![
            video(1, 2, 8),
            video(2, 1, 23),
            video(3, 2, 6),
            video(4, 1, 23),
        ]);
        let ids: Vec<VideoId> = collection.iter().map(VideoDescriptor::id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_forward_only_cursor_and_reset() {
        let mut collection: VideoCollection = vec![video(1, 1, 1), video(2, 1, 2)].into_iter().collect();
        assert_eq!(collection.advance().map(VideoDescriptor::id), Some(1));
        assert_eq!(collection.remaining(), 1);
        assert_eq!(collection.advance().map(VideoDescriptor::id), Some(2));
        assert!(collection.advance().is_none());
        assert_eq!(collection.remaining(), 0);

        collection.reset();
        assert_eq!(collection.remaining(), 2);
        assert_eq!(collection.advance().map(VideoDescriptor::id), Some(1));
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{"id": 5, "path": "a/b.mkv", "date": "2021-06-03", "time": "14:05:09", "fps": 25.0}"#;
        let video: VideoDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(video.id(), 5);
        assert_eq!(video.fps(), Some(25.0));
        assert_eq!(video.duration(), None);
        assert_eq!(video.time(), NaiveTime::from_hms_opt(14, 5, 9).unwrap());
    }
}
