use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::config::ConfigError;
use crate::tracker::ActiveTrack;

/// Draws every active track's box and centroid onto a copy of the frame,
/// plus the object id above the box once a font is loaded.
#[derive(Debug, Clone)]
pub struct Annotator {
    /// Gray level used for the overlay
    pub color: u8,
    /// Box outline width in pixels
    pub thickness: u32,
    /// Id label height in pixels
    pub label_scale: f32,
    font: Option<FontArc>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            color: 255,
            thickness: 2,
            label_scale: 14.0,
            font: None,
        }
    }
}

impl Annotator {
    /// Default overlay with id labels rendered in the given TrueType/OpenType font.
    pub fn from_font_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            ConfigError::invalid("annotate_font", format!("{}: {e}", path.display()))
        })?;
        log::debug!("loaded annotation font {}", path.display());
        Ok(Self::default().with_font(font))
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Whether id labels are drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn draw(&self, image: &GrayImage, tracks: &[ActiveTrack]) -> GrayImage {
        let mut canvas = image.clone();
        let color = Luma([self.color]);
        for track in tracks {
            let [x, y, w, h] = track.bbox.to_tlwh();
            for inset in 0..self.thickness as i32 {
                let (width, height) = (w - 2 * inset, h - 2 * inset);
                if width <= 0 || height <= 0 {
                    break;
                }
                let rect = Rect::at(x + inset, y + inset).of_size(width as u32, height as u32);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }
            draw_cross_mut(&mut canvas, color, track.centroid.x, track.centroid.y);

            if let Some(font) = &self.font {
                // Above the box, or inside it when the box touches the top edge
                let label_y = (y - self.label_scale.ceil() as i32).max(0);
                draw_text_mut(
                    &mut canvas,
                    color,
                    x,
                    label_y,
                    PxScale::from(self.label_scale),
                    font,
                    &track.id.to_string(),
                );
            }
        }
        canvas
    }
}
