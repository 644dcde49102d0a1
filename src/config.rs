use image::Rgb;

use crate::error::MapperError;

const TILE_WIDTH: u32 = 16;
const TILE_HEIGHT: u32 = 16;
const PREVIEW_SCALE: u32 = 16;
const CONTEXT_TILES: u32 = 1;
const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PIXEL_TOLERANCE: f32 = 0.02;
const MAX_SAMPLES_PER_LABEL: usize = 8;
const MAX_PREVIEW_SIDE: u32 = 16_384;

/// Label recorded for tiles the operator skipped.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Configuration for slicing, previewing and learning map tiles.
///
/// Defaults match 16x16 pixel tiles shown at 16x magnification with one tile
/// of surrounding context.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub preview_scale: u32,
    pub context_tiles: u32,
    pub highlight_color: Rgb<u8>,
    pub pixel_tolerance: f32,
    pub max_samples_per_label: usize,
    pub keep_samples: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
            preview_scale: PREVIEW_SCALE,
            context_tiles: CONTEXT_TILES,
            highlight_color: HIGHLIGHT_COLOR,
            pixel_tolerance: PIXEL_TOLERANCE,
            max_samples_per_label: MAX_SAMPLES_PER_LABEL,
            keep_samples: false,
        }
    }
}

impl MapperConfig {
    pub fn validate(&self) -> Result<(), MapperError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(MapperError::InvalidConfig(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        if self.preview_scale == 0 {
            return Err(MapperError::InvalidConfig(
                "preview scale must be at least 1".to_string(),
            ));
        }
        if self.preview_extent(self.tile_width).is_none()
            || self.preview_extent(self.tile_height).is_none()
        {
            return Err(MapperError::InvalidConfig(format!(
                "preview of {} context tiles at {}x does not fit {}x{} tiles",
                self.context_tiles, self.preview_scale, self.tile_width, self.tile_height
            )));
        }
        if !(0.0..=1.0).contains(&self.pixel_tolerance) {
            return Err(MapperError::InvalidConfig(format!(
                "pixel tolerance must be within 0.0..=1.0, got {}",
                self.pixel_tolerance
            )));
        }
        Ok(())
    }

    /// Largest magnified preview side for one tile dimension, `None` on overflow.
    fn preview_extent(&self, tile: u32) -> Option<u32> {
        let span = self.context_tiles.checked_mul(2)?.checked_add(1)?;
        let side = tile.checked_mul(span)?.checked_mul(self.preview_scale)?;
        (side <= MAX_PREVIEW_SIDE).then_some(side)
    }
}
