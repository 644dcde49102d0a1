use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tile_mapper::imaging::{FilePreview, NoPreview, PreviewSink, RerunPreview};
use tile_mapper::labeler::{Labeler, PromptLabeler, SkipLabeler};
use tile_mapper::matcher::{MatchStrategy, matcher_for};
use tile_mapper::plot_grid::render_label_plot_rgba;
use tile_mapper::{MapBuilder, MapOutcome, MapperConfig, MapperError, TileCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PreviewMode {
    /// Overwrite a PNG file with each preview
    File,
    /// Stream previews to a rerun viewer
    Rerun,
    /// No preview
    None,
}

#[derive(Parser, Debug)]
#[command(
    name = "tile_mapper",
    about = "Label every tile of a map image and write the label grid as JSON",
    version
)]
struct Cli {
    /// Map image to slice into tiles
    #[arg(short = 'i', long = "image", default_value = "gray_map.png")]
    image: PathBuf,

    /// Known-tile catalog, read at start and rewritten after every new label
    #[arg(short = 'c', long = "catalog", default_value = "known_tiles.json")]
    catalog: PathBuf,

    /// Where to write the label grid
    #[arg(short = 'o', long = "output", default_value = "map_array.json")]
    output: PathBuf,

    #[arg(long = "tile-width", default_value_t = 16)]
    tile_width: u32,

    #[arg(long = "tile-height", default_value_t = 16)]
    tile_height: u32,

    /// How tiles are matched against the catalog
    #[arg(short = 'm', long = "matcher", value_enum, default_value_t = MatchStrategy::Hash)]
    matcher: MatchStrategy,

    /// Largest normalized pixel difference accepted by the pixel matcher
    #[arg(long = "tolerance", default_value_t = 0.02)]
    tolerance: f32,

    #[arg(long = "preview", value_enum, default_value_t = PreviewMode::File)]
    preview: PreviewMode,

    #[arg(long = "preview-path", default_value = "tile_preview.png")]
    preview_path: PathBuf,

    /// Preview magnification
    #[arg(long = "scale", default_value_t = 16)]
    scale: u32,

    /// Tiles of context shown around an unknown tile
    #[arg(long = "context", default_value_t = 1)]
    context: u32,

    /// Record unknown tiles as "unknown" instead of prompting
    #[arg(long = "non-interactive")]
    non_interactive: bool,

    /// Also render the label grid as a PNG
    #[arg(long = "plot")]
    plot: Option<PathBuf>,

    /// Plot cell size in pixels
    #[arg(long = "cell-size", default_value_t = 12)]
    cell_size: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = MapperConfig {
        tile_width: cli.tile_width,
        tile_height: cli.tile_height,
        preview_scale: cli.scale,
        context_tiles: cli.context,
        pixel_tolerance: cli.tolerance,
        keep_samples: cli.matcher == MatchStrategy::Pixel,
        ..MapperConfig::default()
    };
    config.validate()?;

    let img = image::open(&cli.image).map_err(|source| MapperError::ReadImage {
        path: cli.image.clone(),
        source,
    })?;
    let mut catalog = TileCatalog::load_or_default(&cli.catalog)?;
    info!(
        "{} known tile types ({} hashes)",
        catalog.len(),
        catalog.hash_count()
    );

    let matcher = matcher_for(cli.matcher, cli.tolerance);
    let mut preview: Box<dyn PreviewSink> = match cli.preview {
        PreviewMode::File => Box::new(FilePreview::new(&cli.preview_path)),
        PreviewMode::Rerun => Box::new(RerunPreview::spawn("tile_mapper")?),
        PreviewMode::None => Box::new(NoPreview),
    };
    let mut labeler: Box<dyn Labeler> = if cli.non_interactive {
        Box::new(SkipLabeler)
    } else {
        Box::new(PromptLabeler::stdio())
    };

    let builder = MapBuilder::new(config).with_catalog_path(&cli.catalog);
    let mut outcome = MapOutcome::default();
    let result = builder.build_into(
        &img,
        &mut catalog,
        matcher.as_ref(),
        labeler.as_mut(),
        preview.as_mut(),
        &mut outcome,
    );

    catalog.save(&cli.catalog)?;
    outcome.grid.save(&cli.output)?;
    info!(
        "wrote {}x{} label grid to {}",
        outcome.grid.width(),
        outcome.grid.height(),
        cli.output.display()
    );
    if let Err(e) = result {
        warn!("labeling failed; the grid written so far is partial");
        return Err(e.into());
    }
    if !outcome.completed {
        warn!("labeling was stopped early; the grid is partial");
    }
    info!(
        "recognized {}, learned {}, skipped {}",
        outcome.recognized, outcome.learned, outcome.skipped
    );
    for (label, count) in outcome.grid.label_counts() {
        info!("  {label}: {count}");
    }

    if let Some(plot_path) = &cli.plot {
        let (w, h, pixels) = render_label_plot_rgba(&outcome.grid, cli.cell_size)?;
        if pixels.is_empty() {
            warn!("plot skipped (empty grid)");
        } else {
            let rgba = image::RgbaImage::from_raw(w, h, pixels)
                .ok_or_else(|| format!("Failed to build RGBA image for plot ({w}x{h})"))?;
            if let Some(parent) = plot_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            rgba.save(plot_path)?;
            info!("wrote plot {}", plot_path.display());
        }
    }

    Ok(())
}
