//! Visualization tools for growth curves and image overlays.
//!
//! Growth curves are drawn as `ln(value)` scatter plots with the fitted line of
//! each well. Lane and colony overlays draw on top of the analysed grayscale
//! image so the segmentation can be checked by eye.

use std::collections::HashMap;
use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::frame::GrayFrame;
use crate::core::records::{ColonyResult, GrowthFit, LaneResult, TidyRecord};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("No fitted wells to plot")]
    NoFits,

    #[error("Image has no pixels")]
    EmptyImage,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1280;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 800;

/// Color palette, cycled per well, lane or colony.
const PALETTE: &[(u8, u8, u8)] = &[
    (228, 26, 28),   // Red
    (55, 126, 184),  // Blue
    (77, 175, 74),   // Green
    (152, 78, 163),  // Purple
    (255, 127, 0),   // Orange
    (166, 86, 40),   // Brown
    (247, 129, 191), // Pink
    (0, 206, 209),   // Turquoise
    (138, 43, 226),  // Blue Violet
    (255, 215, 0),   // Gold
];

fn palette_color(index: usize) -> RGBColor {
    let c = PALETTE[index % PALETTE.len()];
    RGBColor(c.0, c.1, c.2)
}

fn plotting_error<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Plot `ln(value)` against time for the `max_wells` best fits, with each
/// well's fitted line, and save as PNG.
///
/// Only positive readings are drawn, since those are the ones the fit used.
pub fn plot_growth_curves(
    output_path: &Path,
    records: &[TidyRecord],
    fits: &[GrowthFit],
    max_wells: usize,
) -> Result<()> {
    let shown: Vec<&GrowthFit> = fits.iter().take(max_wells).collect();
    if shown.is_empty() {
        return Err(VisualizationError::NoFits);
    }

    let color_of: HashMap<&str, usize> = shown
        .iter()
        .enumerate()
        .map(|(i, fit)| (fit.well.as_str(), i))
        .collect();

    let points: Vec<(f64, f64, usize)> = records
        .iter()
        .filter(|r| r.value > 0.0)
        .filter_map(|r| color_of.get(r.well.as_str()).map(|&i| (r.time, r.value.ln(), i)))
        .collect();

    let (x_min, x_max, y_min, y_max) = compute_bounds(&points);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(plotting_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()
        .map_err(plotting_error)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y, i)| Circle::new((x, y), 4, palette_color(i).filled())),
        )
        .map_err(plotting_error)?;

    for (i, fit) in shown.iter().enumerate() {
        let times = points.iter().filter(|p| p.2 == i).map(|p| p.0);
        let (t0, t1) = times.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });
        if !t0.is_finite() || !t1.is_finite() {
            continue;
        }

        let line = [t0, t1].map(|t| (t, fit.intercept + fit.growth_rate * t));
        chart
            .draw_series(LineSeries::new(line, palette_color(i).stroke_width(2)))
            .map_err(plotting_error)?;
    }

    root.present().map_err(plotting_error)?;
    Ok(())
}

/// Draw lane boundaries over the blot image and save as PNG.
pub fn draw_lane_overlay(output_path: &Path, frame: &GrayFrame, lanes: &[LaneResult]) -> Result<()> {
    let bottom = frame.height() as i32 - 1;

    draw_overlay(output_path, frame, |area| {
        for (i, lane) in lanes.iter().enumerate() {
            let left = lane.x_start as i32;
            let right = lane.x_end as i32 - 1;
            area.draw(&Rectangle::new(
                [(left, 0), (right, bottom)],
                palette_color(i).stroke_width(2),
            ))
            .map_err(plotting_error)?;
        }
        Ok(())
    })
}

/// Circle every counted colony over the plate image and save as PNG.
///
/// Circle radius is that of a disc with the colony's area.
pub fn draw_colony_overlay(
    output_path: &Path,
    frame: &GrayFrame,
    colonies: &[ColonyResult],
) -> Result<()> {
    draw_overlay(output_path, frame, |area| {
        for colony in colonies {
            let radius = (colony.area_pixels as f64 / std::f64::consts::PI).sqrt().round().max(1.0);
            area.draw(&Circle::new(
                (colony.centroid_x as i32, colony.centroid_y as i32),
                radius as i32 + 2,
                palette_color(colony.colony_id - 1).stroke_width(2),
            ))
            .map_err(plotting_error)?;
        }
        Ok(())
    })
}

/// Render `frame` into an RGB buffer, let `draw` annotate it in pixel
/// coordinates, then encode the buffer to `output_path`.
fn draw_overlay<F>(output_path: &Path, frame: &GrayFrame, draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>) -> Result<()>,
{
    if frame.width() == 0 || frame.height() == 0 {
        return Err(VisualizationError::EmptyImage);
    }
    let (width, height) = (frame.width() as u32, frame.height() as u32);

    let mut buffer: Vec<u8> = frame.as_slice().iter().flat_map(|&v| [v, v, v]).collect();

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root)?;
        root.present().map_err(plotting_error)?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        VisualizationError::PlottingError("overlay buffer size mismatch".to_string())
    })?;
    image.save(output_path)?;
    Ok(())
}

/// Compute the bounds (min/max) for x and y coordinates.
fn compute_bounds(points: &[(f64, f64, usize)]) -> (f64, f64, f64, f64) {
    if points.is_empty() {
        return (0.0, 1.0, 0.0, 1.0);
    }

    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for (x, y, _) in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}
