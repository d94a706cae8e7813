/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored in TLWH form (top-left x, top-left y, width, height). Boxes are
/// recomputed from contours on every frame and never carried across frames
/// except as part of an object's observation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Top-left x coordinate
    pub x: i32,
    /// Top-left y coordinate
    pub y: i32,
    /// Width of the bounding box
    pub width: i32,
    /// Height of the bounding box
    pub height: i32,
}

impl BoundingBox {
    /// Create a new box from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    ///
    /// The bottom-right corner is exclusive.
    #[inline]
    pub fn from_tlbr(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2), bottom-right exclusive.
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Get the centroid of the bounding box.
    #[inline]
    pub fn centroid(&self) -> Centroid {
        Centroid::from_bbox(self)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let [ax1, ay1, ax2, ay2] = self.to_tlbr();
        let [bx1, by1, bx2, by2] = other.to_tlbr();
        BoundingBox::from_tlbr(ax1.min(bx1), ay1.min(by1), ax2.max(bx2), ay2.max(by2))
    }

    /// Euclidean distance between the closest edges of two boxes.
    ///
    /// Zero when the boxes touch or overlap.
    pub fn gap(&self, other: &BoundingBox) -> f64 {
        let [ax1, ay1, ax2, ay2] = self.to_tlbr();
        let [bx1, by1, bx2, by2] = other.to_tlbr();
        let dx = (bx1 - ax2).max(ax1 - bx2).max(0) as f64;
        let dy = (by1 - ay2).max(ay1 - by2).max(0) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Integer center point of a bounding box, the feature the tracker matches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `cx = (2x + w) / 2`, `cy = (2y + h) / 2`, floor division.
    #[inline]
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self {
            x: (2 * bbox.x + bbox.width).div_euclid(2),
            y: (2 * bbox.y + bbox.height).div_euclid(2),
        }
    }

    /// Euclidean distance to another centroid.
    #[inline]
    pub fn distance(&self, other: &Centroid) -> f64 {
        nalgebra::distance(&self.to_point(), &other.to_point())
    }

    fn to_point(self) -> nalgebra::Point2<f64> {
        nalgebra::Point2::new(self.x as f64, self.y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_conversions() {
        let bbox = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(bbox.to_tlwh(), [10, 20, 30, 40]);
        assert_eq!(bbox.to_tlbr(), [10, 20, 40, 60]);
        assert_eq!(BoundingBox::from_tlbr(10, 20, 40, 60), bbox);
        assert_eq!(bbox.area(), 1200);
    }

    #[test]
    fn test_centroid_integer_division() {
        // (2*10 + 31) / 2 = 25 (floor), (2*20 + 41) / 2 = 40
        let bbox = BoundingBox::new(10, 20, 31, 41);
        assert_eq!(bbox.centroid(), Centroid::new(25, 40));

        let zero = BoundingBox::new(0, 0, 1, 1);
        assert_eq!(zero.centroid(), Centroid::new(0, 0));
    }

    #[test]
    fn test_centroid_distance() {
        let a = Centroid::new(341, 264);
        let b = Centroid::new(421, 427);
        assert!((a.distance(&b) - 181.573_676_5).abs() < 1e-6);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(20, 5, 10, 10);
        assert_eq!(a.union(&b), BoundingBox::new(0, 0, 30, 15));
    }

    #[test]
    fn test_gap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        // Touching on the right edge
        assert_eq!(a.gap(&BoundingBox::new(10, 0, 5, 5)), 0.0);
        // Overlapping
        assert_eq!(a.gap(&BoundingBox::new(5, 5, 10, 10)), 0.0);
        // 3 px right, 4 px below: diagonal gap of 5
        assert!((a.gap(&BoundingBox::new(13, 14, 5, 5)) - 5.0).abs() < 1e-9);
    }
}
