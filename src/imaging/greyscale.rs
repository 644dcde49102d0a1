use image::{DynamicImage, GrayImage};
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};
use std::path::Path;
use tracing::debug;

use crate::error::MapperError;

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

/// Converts an image to 8-bit luminance using kornia's RGB weights.
pub fn to_greyscale(source: &DynamicImage) -> Result<GrayImage, MapperError> {
    let rgb = source.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Ok(GrayImage::new(width, height));
    }

    let image = CpuImage::<u8, 3>::new(
        ImageSize {
            width: width as usize,
            height: height as usize,
        },
        rgb.into_raw(),
        CpuAllocator,
    )?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;

    GrayImage::from_raw(width, height, gray.as_slice().to_vec())
        .ok_or(MapperError::BufferSize { width, height })
}

/// Reads `input`, converts it to greyscale and writes the result to `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<GrayImage, MapperError> {
    let source = image::open(input).map_err(|source| MapperError::ReadImage {
        path: input.to_path_buf(),
        source,
    })?;
    debug!(
        "converting {} ({}x{})",
        input.display(),
        source.width(),
        source.height()
    );
    let gray = to_greyscale(&source)?;
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    gray.save(output)?;
    Ok(gray)
}
