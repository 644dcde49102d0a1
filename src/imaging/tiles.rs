use image::{GrayImage, imageops};

use crate::config::MapperConfig;

/// Tile grid dimensions for an image. Edge tiles may be partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub cols: u32,
    pub rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileLayout {
    pub fn new(image_width: u32, image_height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            cols: image_width.div_ceil(tile_width.max(1)),
            rows: image_height.div_ceil(tile_height.max(1)),
            tile_width,
            tile_height,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// One slice of the greyscale map, positioned in both grid and pixel space.
#[derive(Debug, Clone)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub pixels: GrayImage,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_partial(&self, config: &MapperConfig) -> bool {
        self.width() < config.tile_width || self.height() < config.tile_height
    }
}

/// Cuts the image into rows of tiles, top to bottom and left to right.
pub fn slice_tiles(gray: &GrayImage, config: &MapperConfig) -> Vec<Vec<Tile>> {
    let (width, height) = gray.dimensions();
    let layout = TileLayout::new(width, height, config.tile_width, config.tile_height);

    (0..layout.rows)
        .map(|row| {
            let y = row * config.tile_height;
            let h = config.tile_height.min(height - y);
            (0..layout.cols)
                .map(|col| {
                    let x = col * config.tile_width;
                    let w = config.tile_width.min(width - x);
                    Tile {
                        row,
                        col,
                        x,
                        y,
                        pixels: imageops::crop_imm(gray, x, y, w, h).to_image(),
                    }
                })
                .collect()
        })
        .collect()
}
