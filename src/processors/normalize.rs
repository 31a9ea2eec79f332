//! Layout inference for plate-reader exports.
//!
//! Turns an arbitrary text grid into tidy `(well, time, value)` records by
//! trying three layout heuristics in priority order; the first that yields any
//! record wins:
//!
//! 1. **Plate matrix**: rows labelled `A`..`H` with up to twelve readings each
//!    (a single snapshot, every record gets `time = 0`).
//! 2. **Long format**: a header row with well, time and value columns.
//! 3. **Time-first wide**: time in column 0, one column per well label.
//!
//! The normalizer is total: unrecognized input produces an empty set plus a
//! note explaining why.
//!
//! # Example
//!
//! ```
//! use plate_pipeline::core::Grid;
//! use plate_pipeline::config::NormalizerConfig;
//! use plate_pipeline::processors::normalize::normalize_grid;
//!
//! let grid = Grid::from_rows(vec![vec!["Well", "Time", "OD"], vec!["A1", "0", "0.5"]]);
//! let (set, _layout) = normalize_grid(&grid, &NormalizerConfig::default());
//! assert_eq!(set.len(), 1);
//! ```

use log::{debug, info, warn};

use crate::config::NormalizerConfig;
use crate::core::grid::{canonical_well, parse_number, row_letter, Grid};
use crate::core::records::{TidyRecord, TidySet};

/// Keywords that mark a long-format header row.
const HEADER_KEYWORDS: &[&str] = &["well", "time", "od", "rfu", "abs", "signal", "value"];

const WELL_KEYWORDS: &[&str] = &["well"];
const TIME_KEYWORDS: &[&str] = &["time", "minute", "hour"];
const VALUE_KEYWORDS: &[&str] = &["value", "od", "rfu", "signal", "abs"];

/// Which heuristic produced a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    PlateMatrix,
    Long,
    TimeFirstWide,
}

impl GridLayout {
    pub fn describe(&self) -> &'static str {
        match self {
            GridLayout::PlateMatrix => "row-letter plate matrix",
            GridLayout::Long => "long format (well/time/value columns)",
            GridLayout::TimeFirstWide => "time-first wide format",
        }
    }
}

/// A layout heuristic: `Some(records)` when it recognizes the grid.
pub type LayoutStrategy = fn(&Grid, &NormalizerConfig) -> Option<Vec<TidyRecord>>;

/// Heuristics in the order they are tried.
pub const STRATEGIES: [(GridLayout, LayoutStrategy); 3] = [
    (GridLayout::PlateMatrix, plate_matrix),
    (GridLayout::Long, long_format),
    (GridLayout::TimeFirstWide, time_first_wide),
];

/// Normalize a grid into tidy records.
///
/// Returns the record set (with notes) and the layout that matched, or `None`
/// when no heuristic recognized the grid.
pub fn normalize_grid(grid: &Grid, config: &NormalizerConfig) -> (TidySet, Option<GridLayout>) {
    for (layout, strategy) in STRATEGIES {
        match strategy(grid, config) {
            Some(records) if !records.is_empty() => {
                let mut set = TidySet::new(records, Vec::new());
                let note = format!(
                    "Detected {}: {} readings across {} wells.",
                    layout.describe(),
                    set.len(),
                    set.well_count()
                );
                info!("{}", note);
                set.note(note);
                if layout == GridLayout::PlateMatrix {
                    set.note(
                        "Plate matrix readings are a single snapshot (time = 0); growth fitting needs a time series.",
                    );
                }
                return (set, Some(layout));
            }
            _ => debug!("{} did not match", layout.describe()),
        }
    }

    warn!(
        "no tidy rows found in {}x{} grid",
        grid.height(),
        grid.width()
    );
    let mut set = TidySet::default();
    set.note(
        "No tidy rows found: expected a plate matrix (rows A-H), a Well/Time/Value table, or time in the first column with well labels as headers.",
    );
    (set, None)
}

/// Plate matrix: rows whose first cell is a bare letter A-H, readings in
/// columns 1..=12.
pub fn plate_matrix(grid: &Grid, config: &NormalizerConfig) -> Option<Vec<TidyRecord>> {
    let scan_end = grid.height().min(config.max_scan_rows);
    let start = (0..scan_end).find(|&r| row_letter(grid.cell(r, 0)).is_some())?;

    let mut records = Vec::new();
    for r in start..scan_end {
        let Some(letter) = row_letter(grid.cell(r, 0)) else {
            continue;
        };
        for col in 1..=config.plate_columns {
            if let Some(value) = parse_number(grid.cell(r, col)) {
                records.push(TidyRecord::new(format!("{}{}", letter, col), 0.0, value));
            }
        }
    }

    (!records.is_empty()).then_some(records)
}

/// Index of the first cell whose lowercased text contains any keyword.
fn find_column(header: &[String], keywords: &[&str], skip: &[usize]) -> Option<usize> {
    header.iter().enumerate().position(|(i, cell)| {
        if skip.contains(&i) {
            return false;
        }
        let lower = cell.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    })
}

/// Row among the first `max_rows` with the most cells containing a keyword.
///
/// Ties go to the earliest row. Returns `None` when no row has a hit.
pub fn find_header_row(grid: &Grid, keywords: &[&str], max_rows: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for r in 0..grid.height().min(max_rows) {
        let hits = grid
            .row(r)
            .iter()
            .filter(|cell| {
                let lower = cell.to_lowercase();
                keywords.iter().any(|k| lower.contains(k))
            })
            .count();

        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((r, hits));
        }
    }

    best.map(|(r, _)| r)
}

/// Long format: a header row naming well, time and value columns.
pub fn long_format(grid: &Grid, config: &NormalizerConfig) -> Option<Vec<TidyRecord>> {
    let header_row = find_header_row(grid, HEADER_KEYWORDS, config.max_scan_rows)?;
    let header = grid.row(header_row);

    let well_col = find_column(header, WELL_KEYWORDS, &[])?;
    let time_col = find_column(header, TIME_KEYWORDS, &[well_col])?;
    let value_col = find_column(header, VALUE_KEYWORDS, &[well_col, time_col])?;

    debug!(
        "long format header at row {}: well={} time={} value={}",
        header_row, well_col, time_col, value_col
    );

    let records: Vec<TidyRecord> = (header_row + 1..grid.height())
        .filter_map(|r| {
            let well = canonical_well(grid.cell(r, well_col))?;
            let time = parse_number(grid.cell(r, time_col))?;
            let value = parse_number(grid.cell(r, value_col))?;
            Some(TidyRecord::new(well, time, value))
        })
        .collect();

    (!records.is_empty()).then_some(records)
}

/// Time-first wide: column 0 holds time, every other header cell a well.
pub fn time_first_wide(grid: &Grid, config: &NormalizerConfig) -> Option<Vec<TidyRecord>> {
    let header_row = find_header_row(grid, HEADER_KEYWORDS, config.max_scan_rows).unwrap_or(0);
    let first_data = header_row + 1;
    if first_data >= grid.height() {
        return None;
    }

    let sampled = (grid.height() - first_data).min(config.wide_sample_rows);
    let numeric = (first_data..first_data + sampled)
        .filter(|&r| parse_number(grid.cell(r, 0)).is_some())
        .count();
    let required = config
        .wide_min_numeric_rows
        .max((config.wide_numeric_fraction * sampled as f64).ceil() as usize);

    if numeric < required {
        debug!(
            "time-first wide rejected: {} of {} sampled rows numeric, need {}",
            numeric, sampled, required
        );
        return None;
    }

    let wells: Vec<(usize, String)> = grid
        .row(header_row)
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(c, label)| canonical_well(label).map(|w| (c, w)))
        .collect();

    let mut records = Vec::new();
    for r in first_data..grid.height() {
        let Some(time) = parse_number(grid.cell(r, 0)) else {
            continue;
        };
        for (c, well) in &wells {
            if let Some(value) = parse_number(grid.cell(r, *c)) {
                records.push(TidyRecord::new(well.clone(), time, value));
            }
        }
    }

    (!records.is_empty()).then_some(records)
}
