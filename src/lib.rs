//! Turns a tile-based map image into a grid of tile-type labels.
//!
//! The image is cut into fixed-size tiles, each tile is looked up in a catalog
//! of known tile types, and tiles nobody has seen before are handed to an
//! operator for labeling. The catalog grows as the map is walked.

pub mod catalog;
pub mod config;
pub mod error;
pub mod imaging;
pub mod label_grid;
pub mod labeler;
pub mod map_builder;
pub mod matcher;
pub mod persist;
pub mod plot_grid;

pub use catalog::TileCatalog;
pub use config::MapperConfig;
pub use error::MapperError;
pub use label_grid::LabelGrid;
pub use map_builder::{MapBuilder, MapOutcome};
