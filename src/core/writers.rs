//! CSV writers for pipeline results.
//!
//! One writer per result type:
//! - Tidy records (`well,time,value,group`)
//! - Growth fits
//! - Lane quantification
//! - Colony counts
//!
//! Missing optional values are written as empty cells.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::records::{ColonyResult, GrowthFit, LaneResult, TidyRecord};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

/// Write a header and rows to a CSV file, creating parent directories.
fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut csv_writer = csv::Writer::from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();

    csv_writer
        .write_record(header)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for row in rows {
        csv_writer
            .write_record(&row)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write tidy records as `well,time,value,group`.
pub fn write_tidy_csv(path: &Path, records: &[TidyRecord]) -> Result<()> {
    write_rows(
        path,
        &["well", "time", "value", "group"],
        records.iter().map(|r| {
            vec![
                r.well.clone(),
                r.time.to_string(),
                r.value.to_string(),
                r.group.clone().unwrap_or_default(),
            ]
        }),
    )
}

/// Write growth fits in the order given (best R² first when produced by the
/// fitter).
pub fn write_fits_csv(path: &Path, fits: &[GrowthFit]) -> Result<()> {
    write_rows(
        path,
        &[
            "well",
            "growth_rate",
            "r_squared",
            "intercept",
            "points",
            "doubling_time",
        ],
        fits.iter().map(|f| {
            vec![
                f.well.clone(),
                format!("{:.6}", f.growth_rate),
                format!("{:.6}", f.r_squared),
                format!("{:.6}", f.intercept),
                f.points.to_string(),
                format_optional(f.doubling_time),
            ]
        }),
    )
}

/// Write lane quantification results.
pub fn write_lanes_csv(path: &Path, lanes: &[LaneResult]) -> Result<()> {
    write_rows(
        path,
        &[
            "lane",
            "x_start",
            "x_end",
            "integrated_intensity",
            "relative_density",
        ],
        lanes.iter().map(|l| {
            vec![
                l.lane_index.to_string(),
                l.x_start.to_string(),
                l.x_end.to_string(),
                format!("{:.1}", l.integrated_intensity),
                format_optional(l.relative_density),
            ]
        }),
    )
}

/// Write colony segmentation results.
pub fn write_colonies_csv(path: &Path, colonies: &[ColonyResult]) -> Result<()> {
    write_rows(
        path,
        &["colony", "area_pixels", "centroid_x", "centroid_y"],
        colonies.iter().map(|c| {
            vec![
                c.colony_id.to_string(),
                c.area_pixels.to_string(),
                c.centroid_x.to_string(),
                c.centroid_y.to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_tidy_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tidy.csv");
        let mut grouped = TidyRecord::new("A2", 1.5, 0.25);
        grouped.group = Some("wt".to_string());
        let records = vec![TidyRecord::new("A1", 0.0, 0.5), grouped];

        write_tidy_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "well,time,value,group");
        assert_eq!(lines[1], "A1,0,0.5,");
        assert_eq!(lines[2], "A2,1.5,0.25,wt");
    }

    #[test]
    fn test_write_fits_csv_missing_doubling_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fits.csv");
        let fits = vec![GrowthFit {
            well: "B3".to_string(),
            growth_rate: -0.1,
            r_squared: 0.9,
            intercept: 1.0,
            points: 5,
            doubling_time: None,
        }];

        write_fits_csv(&path, &fits).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("B3,-0.100000,0.900000"));
        assert!(lines[1].ends_with(",5,"));
    }

    #[test]
    fn test_write_lanes_csv_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lanes.csv");
        let lanes = vec![
            LaneResult {
                lane_index: 1,
                x_start: 0,
                x_end: 5,
                integrated_intensity: 100.0,
                relative_density: Some(1.0),
            },
            LaneResult {
                lane_index: 2,
                x_start: 5,
                x_end: 11,
                integrated_intensity: 50.0,
                relative_density: Some(0.5),
            },
        ];

        write_lanes_csv(&path, &lanes).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "lane,x_start,x_end,integrated_intensity,relative_density");
        assert_eq!(lines[2], "2,5,11,50.0,0.500000");
    }

    #[test]
    fn test_write_colonies_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colonies.csv");
        let colonies = vec![ColonyResult {
            colony_id: 1,
            area_pixels: 25,
            centroid_x: 4.0,
            centroid_y: 7.0,
        }];

        write_colonies_csv(&path, &colonies).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("1,25,4,7"));
    }
}
