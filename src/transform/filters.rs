//! Stateless per-frame filters.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::map::map_colors;
use serde::{Deserialize, Serialize};

use super::{ImageTransform, TransformError, check_image};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// `255` above the level, else `0`
    #[default]
    Binary,
    /// `0` above the level, else `255`
    BinaryInv,
    /// Clamp to the level
    Trunc,
    /// Keep pixels above the level, zero the rest
    Tozero,
    /// Zero pixels above the level, keep the rest
    TozeroInv,
}

impl ThresholdMode {
    fn apply(self, pixel: u8, level: u8) -> u8 {
        let above = pixel > level;
        match self {
            ThresholdMode::Binary => if above { 255 } else { 0 },
            ThresholdMode::BinaryInv => if above { 0 } else { 255 },
            ThresholdMode::Trunc => pixel.min(level),
            ThresholdMode::Tozero => if above { pixel } else { 0 },
            ThresholdMode::TozeroInv => if above { 0 } else { pixel },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub level: u8,
    pub mode: ThresholdMode,
}

impl ImageTransform for Threshold {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        let (level, mode) = (self.level, self.mode);
        Ok(map_colors(image, |Luma([p])| Luma([mode.apply(p, level)])))
    }
}

/// Binary threshold at the level picked by Otsu's method for each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtsuThreshold;

impl ImageTransform for OtsuThreshold {
    fn name(&self) -> &'static str {
        "otsu_threshold"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        let level = imageproc::contrast::otsu_level(image);
        Ok(map_colors(image, |Luma([p])| {
            Luma([ThresholdMode::Binary.apply(p, level)])
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GaussianBlur {
    sigma: f32,
}

impl GaussianBlur {
    /// `sigma` must be finite and positive; see [`TransformSpec::build`](super::TransformSpec::build).
    pub(crate) fn new(sigma: f32) -> Self {
        Self { sigma }
    }
}

impl ImageTransform for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }
}

/// Median filter, the usual noise reduction after background subtraction.
#[derive(Debug, Clone, Copy)]
pub struct MedianBlur {
    pub radius: u32,
}

impl ImageTransform for MedianBlur {
    fn name(&self) -> &'static str {
        "median_blur"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        Ok(imageproc::filter::median_filter(image, self.radius, self.radius))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EqualizeHistogram;

impl ImageTransform for EqualizeHistogram {
    fn name(&self) -> &'static str {
        "equalize_histogram"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        Ok(imageproc::contrast::equalize_histogram(image))
    }
}

/// Gamma correction through a 256-entry lookup table.
#[derive(Debug, Clone)]
pub struct Gamma {
    gamma: f32,
    table: [u8; 256],
}

impl Gamma {
    pub(crate) fn new(gamma: f32) -> Self {
        let inverse = 1.0 / gamma;
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let value = ((i as f32 / 255.0).powf(inverse) * 255.0).round();
            *entry = value.clamp(0.0, 255.0) as u8;
        }
        Self { gamma, table }
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }
}

impl ImageTransform for Gamma {
    fn name(&self) -> &'static str {
        "gamma"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        let table = &self.table;
        Ok(map_colors(image, |Luma([p])| Luma([table[usize::from(p)]])))
    }
}

/// Min-max stretch to the full 0..=255 range.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl ImageTransform for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        let (min, max) = image
            .as_raw()
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        if min == max {
            return Ok(image.clone());
        }
        let span = f32::from(max - min);
        Ok(map_colors(image, |Luma([p])| {
            Luma([(f32::from(p - min) * 255.0 / span).round() as u8])
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Canny {
    low: f32,
    high: f32,
}

impl Canny {
    pub(crate) fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }
}

impl ImageTransform for Canny {
    fn name(&self) -> &'static str {
        "canny"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        Ok(imageproc::edges::canny(image, self.low, self.high))
    }
}

/// Grows foreground regions so fragments of one animal join into one contour.
#[derive(Debug, Clone, Copy)]
pub struct Dilate {
    pub radius: u8,
}

impl ImageTransform for Dilate {
    fn name(&self) -> &'static str {
        "dilate"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        Ok(imageproc::morphology::dilate(image, Norm::LInf, self.radius))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resize {
    percent: u32,
}

impl Resize {
    pub(crate) fn new(percent: u32) -> Self {
        Self { percent }
    }
}

impl ImageTransform for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn transform(&mut self, image: &GrayImage) -> Result<GrayImage, TransformError> {
        check_image(self.name(), image)?;
        let scale = |side: u32| {
            let scaled = (u64::from(side) * u64::from(self.percent) / 100).max(1);
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };
        Ok(imageops::resize(
            image,
            scale(image.width()),
            scale(image.height()),
            FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> GrayImage {
        GrayImage::from_fn(4, 1, |x, _| Luma([[10, 100, 150, 240][x as usize]]))
    }

    fn row(image: &GrayImage) -> Vec<u8> {
        image.as_raw().clone()
    }

    #[test]
    fn test_threshold_modes() {
        let image = ramp();
        let cases = [
            (ThresholdMode::Binary, vec![0, 0, 255, 255]),
            (ThresholdMode::BinaryInv, vec![255, 255, 0, 0]),
            (ThresholdMode::Trunc, vec![10, 100, 100, 100]),
            (ThresholdMode::Tozero, vec![0, 0, 150, 240]),
            (ThresholdMode::TozeroInv, vec![10, 100, 0, 0]),
        ];
        for (mode, expected) in cases {
            let mut threshold = Threshold { level: 100, mode };
            assert_eq!(row(&threshold.transform(&image).unwrap()), expected, "{mode:?}");
        }
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let image = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 20 } else { 220 }]));
        let out = OtsuThreshold.transform(&image).unwrap();
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(7, 0)[0], 255);
    }

    #[test]
    fn test_gamma_one_is_identity() {
        let mut gamma = Gamma::new(1.0);
        assert_eq!(row(&gamma.transform(&ramp()).unwrap()), row(&ramp()));
    }

    #[test]
    fn test_gamma_above_one_brightens() {
        let mut gamma = Gamma::new(2.0);
        let out = gamma.transform(&ramp()).unwrap();
        assert!(out.get_pixel(1, 0)[0] > 100);
    }

    #[test]
    fn test_normalize_stretches_range() {
        let out = Normalize.transform(&ramp()).unwrap();
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn test_normalize_flat_image_unchanged() {
        let image = GrayImage::from_pixel(3, 3, Luma([42]));
        assert_eq!(row(&Normalize.transform(&image).unwrap()), row(&image));
    }

    #[test]
    fn test_dilate_grows_single_pixel() {
        let mut image = GrayImage::new(5, 5);
        image.put_pixel(2, 2, Luma([255]));
        let out = Dilate { radius: 1 }.transform(&image).unwrap();
        assert_eq!(out.pixels().filter(|p| p[0] == 255).count(), 9);
    }

    #[test]
    fn test_median_removes_salt_noise() {
        let mut image = GrayImage::new(5, 5);
        image.put_pixel(2, 2, Luma([255]));
        let out = MedianBlur { radius: 1 }.transform(&image).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_resize_by_percent() {
        let image = GrayImage::new(40, 20);
        let out = Resize::new(50).transform(&image).unwrap();
        assert_eq!(out.dimensions(), (20, 10));

        let small = GrayImage::new(4, 2);
        let out = Resize::new(1000).transform(&small).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn test_blur_keeps_dimensions() {
        let image = GrayImage::from_pixel(6, 4, Luma([80]));
        let out = GaussianBlur::new(1.5).transform(&image).unwrap();
        assert_eq!(out.dimensions(), (6, 4));
    }

    #[test]
    fn test_filters_reject_empty_image() {
        let empty = GrayImage::new(0, 0);
        assert!(Normalize.transform(&empty).is_err());
        assert!(Canny::new(10.0, 50.0).transform(&empty).is_err());
        assert!(EqualizeHistogram.transform(&empty).is_err());
    }
}
