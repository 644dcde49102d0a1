//! Magnified previews of an unknown tile and its neighbours, shown to the
//! operator before they are asked for a label.

use image::{RgbImage, imageops};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::imaging::tiles::Tile;

/// Pixel bounds of a preview region, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.end_x - self.start_x
    }

    pub fn height(&self) -> u32 {
        self.end_y - self.start_y
    }
}

/// Region around `tile` extending `context_tiles` tile-sizes on every side,
/// clamped to the image.
pub fn context_region(
    image_width: u32,
    image_height: u32,
    tile: &Tile,
    config: &MapperConfig,
) -> Region {
    let margin_x = config.tile_width.saturating_mul(config.context_tiles);
    let margin_y = config.tile_height.saturating_mul(config.context_tiles);
    Region {
        start_x: tile.x.saturating_sub(margin_x),
        start_y: tile.y.saturating_sub(margin_y),
        end_x: (tile.x + tile.width())
            .saturating_add(margin_x)
            .min(image_width),
        end_y: (tile.y + tile.height())
            .saturating_add(margin_y)
            .min(image_height),
    }
}

/// Crops the tile's neighbourhood, outlines the tile and magnifies the result.
///
/// Fails when the configuration would magnify past what `validate` accepts.
pub fn render_tile_context(
    source: &RgbImage,
    tile: &Tile,
    config: &MapperConfig,
) -> Result<RgbImage, MapperError> {
    config.validate()?;
    let region = context_region(source.width(), source.height(), tile, config);
    let mut view = imageops::crop_imm(
        source,
        region.start_x,
        region.start_y,
        region.width(),
        region.height(),
    )
    .to_image();

    // One pixel outside the tile on every side.
    let left = (tile.x - region.start_x) as i32 - 1;
    let top = (tile.y - region.start_y) as i32 - 1;
    draw_hollow_rect_mut(
        &mut view,
        Rect::at(left, top).of_size(tile.width() + 2, tile.height() + 2),
        config.highlight_color,
    );

    let scale = config.preview_scale;
    let (Some(width), Some(height)) = (
        view.width().checked_mul(scale),
        view.height().checked_mul(scale),
    ) else {
        return Err(MapperError::InvalidConfig(format!(
            "preview scale {scale} overflows a {}x{} region",
            view.width(),
            view.height()
        )));
    };
    Ok(imageops::resize(
        &view,
        width,
        height,
        imageops::FilterType::Nearest,
    ))
}

/// Destination for tile previews.
pub trait PreviewSink {
    fn show(&mut self, tile: &Tile, preview: &RgbImage) -> Result<(), MapperError>;
}

/// Writes each preview over the same PNG, for an image viewer that reloads on change.
#[derive(Debug, Clone)]
pub struct FilePreview {
    path: PathBuf,
}

impl FilePreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreviewSink for FilePreview {
    fn show(&mut self, tile: &Tile, preview: &RgbImage) -> Result<(), MapperError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        preview.save(&self.path)?;
        info!(
            "preview of tile ({}, {}) written to {}",
            tile.row,
            tile.col,
            self.path.display()
        );
        Ok(())
    }
}

/// Streams previews to a rerun viewer.
pub struct RerunPreview {
    rec: rerun::RecordingStream,
}

impl RerunPreview {
    pub fn spawn(app_id: &str) -> Result<Self, MapperError> {
        let rec = rerun::RecordingStreamBuilder::new(app_id).spawn()?;
        Ok(Self { rec })
    }
}

impl PreviewSink for RerunPreview {
    fn show(&mut self, tile: &Tile, preview: &RgbImage) -> Result<(), MapperError> {
        self.rec.log(
            "preview",
            &rerun::Image::from_elements(
                preview.as_raw().as_slice(),
                [preview.width(), preview.height()],
                rerun::ColorModel::RGB,
            ),
        )?;
        self.rec.log(
            "preview/tile",
            &rerun::TextLog::new(format!(
                "tile row {} col {} at ({}, {})",
                tile.row, tile.col, tile.x, tile.y
            )),
        )?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl PreviewSink for NoPreview {
    fn show(&mut self, _tile: &Tile, _preview: &RgbImage) -> Result<(), MapperError> {
        Ok(())
    }
}
