use kornia::image::ImageError;
use std::path::PathBuf;

/// Errors raised while slicing, recognizing or persisting map tiles.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("cannot read image {}: {source}", path.display())]
    ReadImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("kornia image error: {0}")]
    Kornia(#[from] ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rerun error: {0}")]
    Rerun(#[from] rerun::RecordingStreamError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
    #[error("tile hash {hash} is already labeled '{existing}'")]
    HashConflict { hash: String, existing: String },
    #[error("pixel buffer does not match a {width}x{height} image")]
    BufferSize { width: u32, height: u32 },
    #[error("plot rendering failed: {0}")]
    Plot(String),
}
