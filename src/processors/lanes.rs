//! Blot lane quantification.
//!
//! Splits a dark-on-light blot image into equal-width vertical lanes and
//! integrates inverted intensity (`255 - gray`) over each lane, so dark bands
//! contribute the most signal. Results are normalized to a control lane.

use std::ops::Range;
use std::path::Path;

use anyhow::Result;
use log::{debug, info};

use crate::config::LaneConfig;
use crate::core::frame::GrayFrame;
use crate::core::loaders::load_gray_frame;
use crate::core::records::LaneResult;

/// Column ranges of `lane_count` contiguous lanes over `width` columns.
///
/// Every lane is `width / lane_count` wide except the last, which also takes
/// the remainder, so the ranges cover `0..width` exactly once.
pub fn lane_bounds(width: usize, lane_count: usize) -> Vec<Range<usize>> {
    if lane_count == 0 {
        return Vec::new();
    }
    let lane_width = width / lane_count;
    (0..lane_count)
        .map(|i| {
            let start = i * lane_width;
            let end = if i + 1 == lane_count {
                width
            } else {
                start + lane_width
            };
            start..end
        })
        .collect()
}

/// Per-column darkness: `Σ_y (255 - gray[y, x])`.
pub fn column_darkness(frame: &GrayFrame) -> Vec<f64> {
    let mut darkness = vec![0.0f64; frame.width()];
    for y in 0..frame.height() {
        for (x, &px) in frame.row(y).iter().enumerate() {
            darkness[x] += f64::from(255 - px);
        }
    }
    darkness
}

/// Quantify `lane_count` lanes, normalized to the 1-indexed `control_lane`.
///
/// `relative_density` is `None` for every lane when the control lane's
/// intensity is not positive, or when `control_lane` names no lane.
pub fn quantify_lanes(frame: &GrayFrame, lane_count: usize, control_lane: usize) -> Vec<LaneResult> {
    let darkness = column_darkness(frame);
    let bounds = lane_bounds(frame.width(), lane_count);

    let intensities: Vec<f64> = bounds
        .iter()
        .map(|range| darkness[range.clone()].iter().sum::<f64>())
        .collect();

    let control = control_lane
        .checked_sub(1)
        .and_then(|i| intensities.get(i))
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0);

    if control.is_none() {
        debug!("control lane {} has no positive signal", control_lane);
    }

    bounds
        .into_iter()
        .zip(intensities)
        .enumerate()
        .map(|(i, (range, integrated_intensity))| LaneResult {
            lane_index: i + 1,
            x_start: range.start,
            x_end: range.end,
            integrated_intensity,
            relative_density: control.map(|c| integrated_intensity / c),
        })
        .collect()
}

/// Load an image and quantify its lanes.
pub fn process_lane_image(path: &Path, config: &LaneConfig) -> Result<(GrayFrame, Vec<LaneResult>)> {
    config.validate()?;
    let frame = load_gray_frame(path)?;
    let lanes = quantify_lanes(&frame, config.lane_count, config.control_lane);

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    info!(
        "{}: {}x{} px, {} lanes (control lane {})",
        file_name,
        frame.width(),
        frame.height(),
        lanes.len(),
        config.control_lane
    );

    Ok((frame, lanes))
}
