use bytesize::ByteSize;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tile_mapper::imaging::convert_file;

#[derive(Parser, Debug)]
#[command(
    name = "greyscale",
    about = "Convert a map image to single-channel greyscale",
    version
)]
struct Cli {
    /// Colour map image
    #[arg(short = 'i', long = "input", default_value = "red_map.png")]
    input: PathBuf,

    /// Greyscale image to write
    #[arg(short = 'o', long = "output", default_value = "gray_map.png")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if !cli.input.is_file() {
        return Err(format!(
            "The file '{}' does not exist or is not an image.",
            cli.input.display()
        )
        .into());
    }

    let gray = convert_file(&cli.input, &cli.output)?;
    let size = std::fs::metadata(&cli.output).map(|m| m.len()).unwrap_or(0);
    println!(
        "Greyscale image saved as '{}' ({}x{}, {}).",
        cli.output.display(),
        gray.width(),
        gray.height(),
        ByteSize::b(size)
    );
    Ok(())
}
