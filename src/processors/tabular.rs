//! Tabular pipeline: normalize, label, baseline-correct and fit a plate export.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::config::PipelineConfig;
use crate::core::grid::Grid;
use crate::core::loaders::load_grid;
use crate::core::records::{GrowthFit, TidyRecord};

use super::baseline::subtract_baseline;
use super::growth::fit_growth;
use super::metadata::merge_metadata;
use super::normalize::{normalize_grid, GridLayout};

/// Everything the tabular pipeline produces for one export.
#[derive(Debug, Clone, Default)]
pub struct TabularReport {
    /// Layout that matched, `None` when the grid was not recognized.
    pub layout: Option<GridLayout>,
    pub records: Vec<TidyRecord>,
    pub fits: Vec<GrowthFit>,
    /// Diagnostics from every stage, in stage order.
    pub notes: Vec<String>,
}

/// Run the tabular stages over an in-memory grid.
///
/// Never fails: stages that cannot apply leave the records as they were and
/// explain themselves in `notes`.
pub fn run_tabular(grid: &Grid, metadata: Option<&Grid>, config: &PipelineConfig) -> TabularReport {
    let (mut set, layout) = normalize_grid(grid, &config.normalizer);

    if let Some(metadata) = metadata {
        set = merge_metadata(set, metadata, &config.normalizer);
    }

    if config.normalizer.subtract_baseline && !set.is_empty() {
        set = subtract_baseline(set);
    }

    let fits = if set.is_empty() {
        Vec::new()
    } else {
        fit_growth(&set.records, &config.growth)
    };

    if !set.is_empty() && fits.is_empty() {
        set.note(format!(
            "No growth fits: no well has {} or more positive readings at distinct times.",
            config.growth.min_points
        ));
    }

    TabularReport {
        layout,
        records: set.records,
        fits,
        notes: set.notes,
    }
}

/// Load a delimited export (and optional plate map) and run the tabular
/// pipeline over it.
pub fn process_table_file(
    path: &Path,
    metadata_path: Option<&Path>,
    config: &PipelineConfig,
) -> Result<TabularReport> {
    config.growth.validate()?;

    let grid = load_grid(path).with_context(|| format!("reading {}", path.display()))?;
    let metadata = metadata_path
        .map(|p| load_grid(p).with_context(|| format!("reading metadata {}", p.display())))
        .transpose()?;

    let report = run_tabular(&grid, metadata.as_ref(), config);

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    info!(
        "{}: {} readings, {} fits",
        file_name,
        report.records.len(),
        report.fits.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn long_grid() -> Grid {
        let mut rows = vec![vec!["Well".to_string(), "Time (h)".into(), "OD600".into()]];
        for (t, v) in [(0.0, 0.1), (1.0, 0.2), (2.0, 0.4), (3.0, 0.8), (4.0, 1.6)] {
            rows.push(vec!["A1".into(), t.to_string(), v.to_string()]);
        }
        for t in 0..5 {
            rows.push(vec!["B1".into(), t.to_string(), "0.3".into()]);
        }
        Grid::from_rows(rows)
    }

    #[test]
    fn test_long_format_with_baseline_and_fit() {
        let report = run_tabular(&long_grid(), None, &PipelineConfig::default());

        assert_eq!(report.layout, Some(GridLayout::Long));
        assert_eq!(report.records.len(), 10);
        // Baseline zeroes A1 at t=0 and all of B1, leaving 4 positive A1 points.
        assert_eq!(report.records[0].value, 0.0);
        assert_eq!(report.fits.len(), 1);
        assert_eq!(report.fits[0].well, "A1");
        assert_eq!(report.fits[0].points, 4);
    }

    #[test]
    fn test_without_baseline_raw_series_fits_exactly() {
        let mut config = PipelineConfig::default();
        config.normalizer.subtract_baseline = false;
        let report = run_tabular(&long_grid(), None, &config);

        assert_eq!(report.fits.len(), 2);
        let a1 = report.fits.iter().find(|f| f.well == "A1").unwrap();
        assert!((a1.growth_rate - std::f64::consts::LN_2).abs() < 1e-9);
        assert!((a1.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_metadata_groups_flow_through() {
        let meta = Grid::from_rows(vec![vec!["Well", "Group"], vec!["a01", "treated"]]);
        let report = run_tabular(&long_grid(), Some(&meta), &PipelineConfig::default());

        assert!(report
            .records
            .iter()
            .filter(|r| r.well == "A1")
            .all(|r| r.group.as_deref() == Some("treated")));
        assert!(report.records.iter().filter(|r| r.well == "B1").all(|r| r.group.is_none()));
    }

    #[test]
    fn test_unrecognized_grid_reports_notes() {
        let grid = Grid::from_rows(vec![vec!["hello", "world"], vec!["foo", "bar"]]);
        let report = run_tabular(&grid, None, &PipelineConfig::default());

        assert!(report.layout.is_none());
        assert!(report.records.is_empty());
        assert!(report.fits.is_empty());
        assert!(report.notes[0].starts_with("No tidy rows found"));
    }

    #[test]
    fn test_plate_matrix_snapshot_has_no_fits() {
        let mut rows = vec![vec![String::new()]];
        rows[0].extend((1..=12).map(|c| c.to_string()));
        for letter in ['A', 'B'] {
            let mut row = vec![letter.to_string()];
            row.extend((1..=12).map(|c| format!("0.{}", c)));
            rows.push(row);
        }
        let report = run_tabular(&Grid::from_rows(rows), None, &PipelineConfig::default());

        assert_eq!(report.layout, Some(GridLayout::PlateMatrix));
        assert_eq!(report.records.len(), 24);
        assert!(report.fits.is_empty());
        assert!(report.notes.iter().any(|n| n.starts_with("No growth fits")));
    }

    #[test]
    fn test_two_block_plate_matrix_keeps_raw_readings() {
        let mut rows = Vec::new();
        for block in 0..2 {
            let mut header = vec![format!("Read {}", block + 1)];
            header.extend((1..=12).map(|c| c.to_string()));
            rows.push(header);
            for letter in ['A', 'B'] {
                let mut row = vec![letter.to_string()];
                row.extend((1..=12).map(|c| format!("{}.{}", block + 1, c)));
                rows.push(row);
            }
        }
        let report = run_tabular(&Grid::from_rows(rows), None, &PipelineConfig::default());

        assert_eq!(report.layout, Some(GridLayout::PlateMatrix));
        assert_eq!(report.records.len(), 48);
        assert_eq!(report.records[0].value, 1.1);
        assert!(report.records.iter().all(|r| r.value > 1.0));
        assert!(report.notes.iter().any(|n| n.starts_with("Baseline subtraction skipped")));
        assert!(!report.notes.iter().any(|n| n.starts_with("Subtracted")));
    }

    #[test]
    fn test_process_table_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Time\tA1\tA2").unwrap();
        for (t, a, b) in [(0, 1.0, 0.5), (1, 2.0, 0.5), (2, 4.0, 0.5), (3, 8.0, 0.5), (4, 16.0, 0.5)] {
            writeln!(file, "{}\t{}\t{}", t, a, b).unwrap();
        }
        file.flush().unwrap();

        let report = process_table_file(file.path(), None, &PipelineConfig::default()).unwrap();

        assert_eq!(report.layout, Some(GridLayout::TimeFirstWide));
        assert_eq!(report.records.len(), 10);
        assert_eq!(report.fits.len(), 1);
        assert_eq!(report.fits[0].well, "A1");
    }

    #[test]
    fn test_process_table_file_missing() {
        let result = process_table_file(
            Path::new("/nonexistent/plate.csv"),
            None,
            &PipelineConfig::default(),
        );
        assert!(result.is_err());
    }
}
