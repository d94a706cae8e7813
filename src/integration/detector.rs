//! Detection sources: turning a processed frame into bounding boxes.

use image::GrayImage;
use imageproc::contours::{self, BorderType};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::tracker::BoundingBox;

/// Produces the boxes the tracker matches against.
///
/// Implement this trait to feed the tracker from something other than
/// contours, e.g. a model or a scripted source in tests.
///
/// # Example
///
/// ```ignore
/// use camtrap_track::{BoundingBox, DetectionSource};
///
/// struct FixedDetector(Vec<BoundingBox>);
///
/// impl DetectionSource for FixedDetector {
///     type Error = std::convert::Infallible;
///
///     fn detect(&mut self, _image: &image::GrayImage) -> Result<Vec<BoundingBox>, Self::Error> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Detect objects in the frame's most processed image.
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<BoundingBox>, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("cannot detect contours in a {width}x{height} image")]
    InvalidImage { width: u32, height: u32 },
}

/// Configuration for the ContourDetector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Contours with polygon area at or below this are ignored
    pub min_contour_area: f64,
    /// Boxes whose edge distance is at most this are merged into one
    pub merge_eps: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 50.0,
            merge_eps: 0.0,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("detector.min_contour_area", self.min_contour_area),
            ("detector.merge_eps", self.merge_eps),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a finite number >= 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Finds outer contours of the foreground (non-zero pixels) and reports their
/// bounding boxes, merged where they touch or nearly touch.
#[derive(Debug, Clone, Default)]
pub struct ContourDetector {
    config: DetectorConfig,
}

impl ContourDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl DetectionSource for ContourDetector {
    type Error = DetectionError;

    fn detect(&mut self, image: &GrayImage) -> Result<Vec<BoundingBox>, Self::Error> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidImage { width, height });
        }

        let boxes: Vec<BoundingBox> = contours::find_contours::<i32>(image)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .filter(|contour| polygon_area(&contour.points) > self.config.min_contour_area)
            .filter_map(|contour| bounding_box(&contour.points))
            .collect();

        Ok(merge_boxes(boxes, self.config.merge_eps))
    }
}

/// Shoelace area of the polygon traced by the contour points.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}

/// Smallest box containing every point, border pixels included.
fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        x1 = x1.min(p.x);
        y1 = y1.min(p.y);
        x2 = x2.max(p.x);
        y2 = y2.max(p.y);
    }
    Some(BoundingBox::from_tlbr(x1, y1, x2 + 1, y2 + 1))
}

/// Repeatedly replace any two boxes within `eps` of each other by their union,
/// until no such pair is left.
pub fn merge_boxes(mut boxes: Vec<BoundingBox>, eps: f64) -> Vec<BoundingBox> {
    'outer: loop {
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if boxes[i].gap(&boxes[j]) <= eps {
                    let other = boxes.remove(j);
                    boxes[i] = boxes[i].union(&other);
                    continue 'outer;
                }
            }
        }
        return boxes;
    }
}
