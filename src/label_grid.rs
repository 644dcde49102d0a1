use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::MapperError;
use crate::persist::{to_pretty_json, write_pretty_json};

/// Tile-type labels in map order, one inner vector per tile row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelGrid {
    rows: Vec<Vec<String>>,
}

impl LabelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row; rows are shorter only when labeling stopped early.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in self.rows.iter().flatten() {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_json_string(&self) -> Result<String, MapperError> {
        let bytes = to_pretty_json(self)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn save(&self, path: &Path) -> Result<(), MapperError> {
        write_pretty_json(self, path)
    }

    pub fn load(path: &Path) -> Result<Self, MapperError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
