pub mod greyscale;
pub use greyscale::{convert_file, to_greyscale};
pub mod tiles;
pub use tiles::{Tile, TileLayout, slice_tiles};
pub mod preview;
pub use preview::{FilePreview, NoPreview, PreviewSink, RerunPreview, render_tile_context};
