//! Known-tile catalog: tile-type labels mapped to the hashes (and optional
//! reference samples) of every tile image seen with that label.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::MapperError;
use crate::persist::write_pretty_json;

/// Reference pixels for similarity matching, hex-encoded greyscale bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSample {
    pub width: u32,
    pub height: u32,
    pub pixels: String,
}

impl TileSample {
    pub fn from_image(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: hex::encode(image.as_raw()),
        }
    }

    pub fn to_image(&self) -> Option<GrayImage> {
        let raw = hex::decode(&self.pixels).ok()?;
        GrayImage::from_raw(self.width, self.height, raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<TileSample>,
}

#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    entries: BTreeMap<String, TileEntry>,
    index: HashMap<String, String>,
}

/// Trims an operator-supplied label and rejects empty or command-like ones.
pub fn normalize_label(label: &str) -> Result<String, MapperError> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return Err(MapperError::InvalidLabel(label.to_string()));
    }
    Ok(trimmed.to_string())
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from stored entries, merging labels that differ only
    /// in surrounding whitespace.
    pub fn from_entries(raw: BTreeMap<String, TileEntry>) -> Self {
        let mut entries: BTreeMap<String, TileEntry> = BTreeMap::new();
        for (label, entry) in raw {
            let key = match normalize_label(&label) {
                Ok(key) => key,
                Err(_) => {
                    warn!("catalog label '{label}' is not a usable tile type, keeping it as is");
                    label
                }
            };
            let merged = entries.entry(key).or_default();
            for hash in entry.hashes {
                if !merged.hashes.contains(&hash) {
                    merged.hashes.push(hash);
                }
            }
            for sample in entry.samples {
                if !merged.samples.contains(&sample) {
                    merged.samples.push(sample);
                }
            }
        }

        let mut index = HashMap::new();
        for (label, entry) in &entries {
            for hash in &entry.hashes {
                if let Some(existing) = index.get(hash) {
                    warn!("hash {hash} is listed under '{existing}' and '{label}', keeping '{existing}'");
                    continue;
                }
                index.insert(hash.clone(), label.clone());
            }
        }
        Self { entries, index }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MapperError> {
        let entries: BTreeMap<String, TileEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Loads a catalog, starting empty when the file is missing or not valid JSON.
    pub fn load_or_default(path: &Path) -> Result<Self, MapperError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("no tile catalog at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        match Self::from_json_str(&text) {
            Ok(catalog) => {
                debug!(
                    "loaded {} labels ({} hashes) from {}",
                    catalog.len(),
                    catalog.hash_count(),
                    path.display()
                );
                Ok(catalog)
            }
            Err(e) => {
                warn!("{} is not a valid tile catalog ({e}), starting empty", path.display());
                Ok(Self::new())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), MapperError> {
        write_pretty_json(&self.entries, path)?;
        debug!("saved {} labels to {}", self.len(), path.display());
        Ok(())
    }

    /// Catalog key for `label`: an existing label verbatim, otherwise normalized.
    fn resolve_label(&self, label: &str) -> Result<String, MapperError> {
        if self.entries.contains_key(label) {
            return Ok(label.to_string());
        }
        normalize_label(label)
    }

    pub fn recognize_hash(&self, hash: &str) -> Option<&str> {
        self.index.get(hash).map(String::as_str)
    }

    /// Records `hash` under `label`, creating the label if needed.
    ///
    /// Returns `Ok(false)` when the hash was already recorded for this label.
    pub fn add_hash(&mut self, label: &str, hash: &str) -> Result<bool, MapperError> {
        let label = self.resolve_label(label)?;
        if let Some(existing) = self.index.get(hash) {
            if *existing == label {
                return Ok(false);
            }
            return Err(MapperError::HashConflict {
                hash: hash.to_string(),
                existing: existing.clone(),
            });
        }
        self.entries
            .entry(label.clone())
            .or_default()
            .hashes
            .push(hash.to_string());
        self.index.insert(hash.to_string(), label);
        Ok(true)
    }

    /// Stores a reference sample for `label`, at most `max_per_label` of them.
    pub fn add_sample(
        &mut self,
        label: &str,
        image: &GrayImage,
        max_per_label: usize,
    ) -> Result<bool, MapperError> {
        let label = self.resolve_label(label)?;
        let entry = self.entries.entry(label).or_default();
        if entry.samples.len() >= max_per_label {
            return Ok(false);
        }
        let sample = TileSample::from_image(image);
        if entry.samples.contains(&sample) {
            return Ok(false);
        }
        entry.samples.push(sample);
        Ok(true)
    }

    pub fn entry(&self, label: &str) -> Option<&TileEntry> {
        self.entries.get(label)
    }

    pub fn samples(&self, label: &str) -> &[TileSample] {
        self.entries
            .get(label)
            .map(|e| e.samples.as_slice())
            .unwrap_or(&[])
    }

    /// Labels with their entries, in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TileEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hash_count(&self) -> usize {
        self.index.len()
    }
}
