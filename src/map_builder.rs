//! Walks the map tile by tile, recognizing known tiles and asking the operator
//! about the rest. Every newly labeled tile is added to the catalog at once,
//! so repeats later in the same map are recognized without another prompt.

use image::{DynamicImage, RgbImage};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::catalog::TileCatalog;
use crate::config::{MapperConfig, UNKNOWN_LABEL};
use crate::error::MapperError;
use crate::imaging::greyscale::to_greyscale;
use crate::imaging::preview::{PreviewSink, render_tile_context};
use crate::imaging::tiles::{Tile, slice_tiles};
use crate::label_grid::LabelGrid;
use crate::labeler::{LabelDecision, Labeler};
use crate::matcher::{MatchMethod, Matcher, tile_hash};

/// Result of one labeling pass over a map image.
#[derive(Debug, Clone, Default)]
pub struct MapOutcome {
    pub grid: LabelGrid,
    /// False when labeling stopped or failed before the last tile.
    pub completed: bool,
    pub recognized: usize,
    pub learned: usize,
    pub skipped: usize,
}

enum RowEnd {
    Finished,
    Quit,
}

#[derive(Debug, Clone)]
pub struct MapBuilder {
    config: MapperConfig,
    catalog_path: Option<PathBuf>,
}

impl MapBuilder {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            catalog_path: None,
        }
    }

    /// Saves the catalog to `path` after every newly learned tile.
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn build(
        &self,
        source: &DynamicImage,
        catalog: &mut TileCatalog,
        matcher: &dyn Matcher,
        labeler: &mut dyn Labeler,
        preview: &mut dyn PreviewSink,
    ) -> Result<MapOutcome, MapperError> {
        let mut outcome = MapOutcome::default();
        self.build_into(source, catalog, matcher, labeler, preview, &mut outcome)?;
        Ok(outcome)
    }

    /// Like [`MapBuilder::build`], but fills `outcome` as it goes.
    ///
    /// On error, `outcome.grid` still holds every label assigned so far,
    /// including the partial current row.
    pub fn build_into(
        &self,
        source: &DynamicImage,
        catalog: &mut TileCatalog,
        matcher: &dyn Matcher,
        labeler: &mut dyn Labeler,
        preview: &mut dyn PreviewSink,
        outcome: &mut MapOutcome,
    ) -> Result<(), MapperError> {
        self.config.validate()?;

        let gray = to_greyscale(source)?;
        let rgb = source.to_rgb8();
        let tile_rows = slice_tiles(&gray, &self.config);
        info!(
            "map is {}x{} pixels, {} tile rows",
            gray.width(),
            gray.height(),
            tile_rows.len()
        );

        for tiles in &tile_rows {
            let mut row = Vec::with_capacity(tiles.len());
            let step = self.label_row(
                tiles, &rgb, catalog, matcher, labeler, preview, &mut row, outcome,
            );
            match step {
                Ok(RowEnd::Finished) => outcome.grid.push_row(row),
                Ok(RowEnd::Quit) => {
                    if !row.is_empty() {
                        outcome.grid.push_row(row);
                    }
                    return Ok(());
                }
                Err(e) => {
                    if !row.is_empty() {
                        outcome.grid.push_row(row);
                    }
                    return Err(e);
                }
            }
        }

        outcome.completed = true;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn label_row(
        &self,
        tiles: &[Tile],
        rgb: &RgbImage,
        catalog: &mut TileCatalog,
        matcher: &dyn Matcher,
        labeler: &mut dyn Labeler,
        preview: &mut dyn PreviewSink,
        row: &mut Vec<String>,
        outcome: &mut MapOutcome,
    ) -> Result<RowEnd, MapperError> {
        for tile in tiles {
            debug!("tile ({}, {}) at ({}, {})", tile.row, tile.col, tile.x, tile.y);

            if let Some(hit) = matcher.recognize(tile, catalog) {
                if let MatchMethod::Similar { difference } = hit.method {
                    debug!(
                        "tile ({}, {}) resembles '{}' (difference {difference:.4})",
                        tile.row, tile.col, hit.label
                    );
                    if catalog.add_hash(&hit.label, &hit.hash)? {
                        self.persist(catalog)?;
                    }
                }
                debug!("tile ({}, {}) is '{}'", tile.row, tile.col, hit.label);
                outcome.recognized += 1;
                row.push(hit.label);
                continue;
            }

            info!("unknown tile at row {}, col {}", tile.row, tile.col);
            preview.show(tile, &render_tile_context(rgb, tile, &self.config)?)?;

            match labeler.label_tile(tile)? {
                LabelDecision::Label(label) => {
                    self.learn(catalog, &label, tile)?;
                    outcome.learned += 1;
                    row.push(label);
                }
                LabelDecision::Skip => {
                    outcome.skipped += 1;
                    row.push(UNKNOWN_LABEL.to_string());
                }
                LabelDecision::Quit => {
                    info!("labeling stopped at row {}, col {}", tile.row, tile.col);
                    return Ok(RowEnd::Quit);
                }
            }
        }
        Ok(RowEnd::Finished)
    }

    fn learn(&self, catalog: &mut TileCatalog, label: &str, tile: &Tile) -> Result<(), MapperError> {
        let hash = tile_hash(&tile.pixels);
        catalog.add_hash(label, &hash)?;
        if self.config.keep_samples {
            catalog.add_sample(label, &tile.pixels, self.config.max_samples_per_label)?;
        }
        info!("learned '{label}' ({} labels known)", catalog.len());
        self.persist(catalog)
    }

    fn persist(&self, catalog: &TileCatalog) -> Result<(), MapperError> {
        match &self.catalog_path {
            Some(path) => catalog.save(path),
            None => Ok(()),
        }
    }
}
