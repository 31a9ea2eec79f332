//! Colony counting by connected-component segmentation.
//!
//! Pixels brighter than a threshold are foreground. Foreground pixels that
//! touch up, down, left or right belong to the same colony; diagonal contact
//! does not merge two colonies. Components below a minimum area are dropped as
//! noise.
//!
//! # Algorithm
//!
//! 1. Scan pixels in row-major order
//! 2. On an unvisited foreground pixel, flood fill its component with an
//!    explicit stack, accumulating pixel count and coordinate sums
//! 3. Keep components with at least `min_area` pixels, numbering them in
//!    discovery order
//!
//! Time and memory are O(width * height); the stack never recurses, so one
//! image-sized component cannot overflow the call stack.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::ColonyConfig;
use crate::core::frame::GrayFrame;
use crate::core::loaders::{find_images, load_gray_frame};
use crate::core::records::ColonyResult;

/// Default minimum component area in pixels.
pub const MIN_COLONY_AREA: usize = 18;

/// Pixel count and coordinate sums of one component.
#[derive(Debug, Clone, Copy, Default)]
struct Component {
    count: usize,
    sum_x: u64,
    sum_y: u64,
}

/// Flood fill the 4-connected component containing `seed`, marking it in
/// `visited`.
fn flood_fill(
    foreground: &[bool],
    visited: &mut [bool],
    width: usize,
    height: usize,
    seed: usize,
    stack: &mut Vec<usize>,
) -> Component {
    let mut component = Component::default();

    stack.clear();
    stack.push(seed);
    visited[seed] = true;

    while let Some(idx) = stack.pop() {
        let x = idx % width;
        let y = idx / width;
        component.count += 1;
        component.sum_x += x as u64;
        component.sum_y += y as u64;

        let mut visit = |n: usize| {
            if foreground[n] && !visited[n] {
                visited[n] = true;
                stack.push(n);
            }
        };

        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < width {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - width);
        }
        if y + 1 < height {
            visit(idx + width);
        }
    }

    component
}

/// Segment colonies: foreground is `gray > threshold`, components smaller
/// than `min_area` are discarded.
pub fn segment_colonies(frame: &GrayFrame, threshold: u8, min_area: usize) -> Vec<ColonyResult> {
    let (width, height) = (frame.width(), frame.height());
    let foreground: Vec<bool> = frame.as_slice().iter().map(|&px| px > threshold).collect();
    let mut visited = vec![false; width * height];
    let mut stack = Vec::new();

    let mut colonies = Vec::new();
    let mut discarded = 0usize;

    for seed in 0..width * height {
        if !foreground[seed] || visited[seed] {
            continue;
        }

        let component = flood_fill(&foreground, &mut visited, width, height, seed, &mut stack);
        if component.count < min_area {
            discarded += 1;
            continue;
        }

        let count = component.count as f64;
        colonies.push(ColonyResult {
            colony_id: colonies.len() + 1,
            area_pixels: component.count,
            centroid_x: (component.sum_x as f64 / count).round(),
            centroid_y: (component.sum_y as f64 / count).round(),
        });
    }

    debug!(
        "{} colonies kept, {} components below {} px",
        colonies.len(),
        discarded,
        min_area
    );
    colonies
}

/// Segment with the configured threshold and minimum area.
pub fn count_colonies(frame: &GrayFrame, config: &ColonyConfig) -> Vec<ColonyResult> {
    segment_colonies(frame, config.threshold, config.min_area)
}

/// Load an image and count its colonies.
pub fn process_colony_image(path: &Path, config: &ColonyConfig) -> Result<(GrayFrame, Vec<ColonyResult>)> {
    let frame = load_gray_frame(path)?;
    let colonies = count_colonies(&frame, config);

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    info!(
        "{}: {} colonies (threshold {}, min area {} px)",
        file_name,
        colonies.len(),
        config.threshold,
        config.min_area
    );

    Ok((frame, colonies))
}

/// Count colonies in every image of a directory.
///
/// Images are independent, so they are processed in parallel. Files that fail
/// to decode are logged and left out of the result, which is sorted by path.
pub fn count_colonies_batch(
    directory: &Path,
    config: &ColonyConfig,
) -> Result<Vec<(PathBuf, Vec<ColonyResult>)>> {
    let images = find_images(directory)?;
    if images.is_empty() {
        warn!("no images found in {}", directory.display());
    }

    let results: Vec<(PathBuf, Vec<ColonyResult>)> = images
        .par_iter()
        .filter_map(|path| match process_colony_image(path, config) {
            Ok((_, colonies)) => Some((path.clone(), colonies)),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    Ok(results)
}
