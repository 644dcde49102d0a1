use palette::{FromColor, Hsv, Srgb};
use plotters::prelude::*;
use std::collections::BTreeMap;

use crate::config::UNKNOWN_LABEL;
use crate::error::MapperError;
use crate::label_grid::LabelGrid;

const UNKNOWN_COLOR: RGBColor = RGBColor(200, 200, 200);
const GRID_COLOR: RGBColor = RGBColor(60, 60, 60);

/// Assigns evenly spaced hues to the distinct labels of a grid, in label order.
pub fn label_colors(grid: &LabelGrid) -> BTreeMap<String, RGBColor> {
    let labels: Vec<&str> = grid
        .label_counts()
        .into_keys()
        .filter(|l| *l != UNKNOWN_LABEL)
        .collect();
    let step = 360.0 / labels.len().max(1) as f32;

    let mut colors: BTreeMap<String, RGBColor> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let rgb: Srgb<f32> = Srgb::from_color(Hsv::new(i as f32 * step, 0.55f32, 0.85));
            let (r, g, b) = rgb.into_format::<u8>().into_components();
            (label.to_string(), RGBColor(r, g, b))
        })
        .collect();
    colors.insert(UNKNOWN_LABEL.to_string(), UNKNOWN_COLOR);
    colors
}

/// Renders the label grid as an RGBA buffer, one `cell_px` square per tile.
///
/// Returns `(width, height, pixels)`; an empty grid yields an empty buffer.
pub fn render_label_plot_rgba(
    grid: &LabelGrid,
    cell_px: u32,
) -> Result<(u32, u32, Vec<u8>), MapperError> {
    let cell = cell_px.max(1);
    let side = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|n| n.checked_mul(cell))
            .filter(|&px| px <= i32::MAX as u32)
            .ok_or_else(|| MapperError::Plot(format!("{cells} cells of {cell}px overflow")))
    };
    let width = side(grid.width())?;
    let height = side(grid.height())?;
    if width == 0 || height == 0 {
        return Ok((0, 0, Vec::new()));
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .filter(|n| n.checked_mul(4).is_some())
        .ok_or_else(|| MapperError::Plot("width*height overflow".to_string()))?;
    let colors = label_colors(grid);
    let mut rgb = vec![255u8; pixel_count * 3];

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| MapperError::Plot(e.to_string()))?;

        for (r, row) in grid.rows().iter().enumerate() {
            for (c, label) in row.iter().enumerate() {
                let color = colors.get(label).copied().unwrap_or(UNKNOWN_COLOR);
                let x0 = c as i32 * cell as i32;
                let y0 = r as i32 * cell as i32;
                root.draw(&Rectangle::new(
                    [(x0, y0), (x0 + cell as i32, y0 + cell as i32)],
                    color.filled(),
                ))
                .map_err(|e| MapperError::Plot(e.to_string()))?;
            }
        }

        // Lines are skipped when cells are too small to separate visually.
        if cell >= 4 {
            for c in 0..=grid.width() as i32 {
                let x = (c * cell as i32).min(width as i32 - 1);
                root.draw(&PathElement::new([(x, 0), (x, height as i32 - 1)], GRID_COLOR))
                    .map_err(|e| MapperError::Plot(e.to_string()))?;
            }
            for r in 0..=grid.height() as i32 {
                let y = (r * cell as i32).min(height as i32 - 1);
                root.draw(&PathElement::new([(0, y), (width as i32 - 1, y)], GRID_COLOR))
                    .map_err(|e| MapperError::Plot(e.to_string()))?;
            }
        }

        root.present().map_err(|e| MapperError::Plot(e.to_string()))?;
    }

    let mut rgba = vec![255u8; pixel_count * 4];
    for i in 0..pixel_count {
        rgba[i * 4] = rgb[i * 3];
        rgba[i * 4 + 1] = rgb[i * 3 + 1];
        rgba[i * 4 + 2] = rgb[i * 3 + 2];
    }

    Ok((width, height, rgba))
}
