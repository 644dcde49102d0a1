use image::GrayImage;
use sha2::{Digest, Sha256};

use crate::catalog::TileCatalog;
use crate::imaging::tiles::Tile;

/// Hex SHA-256 of the tile's greyscale bytes in row-major order.
pub fn tile_hash(pixels: &GrayImage) -> String {
    hex::encode(Sha256::digest(pixels.as_raw()))
}

/// Mean absolute difference scaled to 0.0..=1.0, or `None` for mismatched sizes.
pub fn mean_abs_difference(a: &GrayImage, b: &GrayImage) -> Option<f32> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let total = a.as_raw().len();
    if total == 0 {
        return Some(0.0);
    }
    let sum: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&p, &q)| u64::from(p.abs_diff(q)))
        .sum();
    Some(sum as f32 / (total as f32 * 255.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMethod {
    Exact,
    Similar { difference: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub label: String,
    pub hash: String,
    pub method: MatchMethod,
}

/// Looks a tile up in the catalog.
pub trait Matcher {
    fn recognize(&self, tile: &Tile, catalog: &TileCatalog) -> Option<Recognition>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MatchStrategy {
    /// Exact content hash
    Hash,
    /// Content hash, then pixel similarity against stored samples
    Pixel,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HashMatcher;

impl Matcher for HashMatcher {
    fn recognize(&self, tile: &Tile, catalog: &TileCatalog) -> Option<Recognition> {
        let hash = tile_hash(&tile.pixels);
        let label = catalog.recognize_hash(&hash)?.to_string();
        Some(Recognition {
            label,
            hash,
            method: MatchMethod::Exact,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PixelMatcher {
    pub tolerance: f32,
}

impl PixelMatcher {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }
}

impl Matcher for PixelMatcher {
    fn recognize(&self, tile: &Tile, catalog: &TileCatalog) -> Option<Recognition> {
        let hash = tile_hash(&tile.pixels);
        if let Some(label) = catalog.recognize_hash(&hash) {
            return Some(Recognition {
                label: label.to_string(),
                hash,
                method: MatchMethod::Exact,
            });
        }

        let mut best: Option<(&str, f32)> = None;
        for (label, entry) in catalog.iter() {
            for sample in &entry.samples {
                if (sample.width, sample.height) != tile.pixels.dimensions() {
                    continue;
                }
                let Some(reference) = sample.to_image() else {
                    continue;
                };
                let Some(diff) = mean_abs_difference(&tile.pixels, &reference) else {
                    continue;
                };
                // Strict comparison keeps the first label in sorted order on ties.
                if best.is_none_or(|(_, d)| diff < d) {
                    best = Some((label, diff));
                }
            }
        }

        let (label, difference) = best.filter(|&(_, d)| d <= self.tolerance)?;
        Some(Recognition {
            label: label.to_string(),
            hash,
            method: MatchMethod::Similar { difference },
        })
    }
}

pub fn matcher_for(strategy: MatchStrategy, tolerance: f32) -> Box<dyn Matcher> {
    match strategy {
        MatchStrategy::Hash => Box::new(HashMatcher),
        MatchStrategy::Pixel => Box::new(PixelMatcher::new(tolerance)),
    }
}
