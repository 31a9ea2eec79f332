//! Data loaders for plate-reader exports and images.
//!
//! This module provides:
//! - Delimited-text loading (CSV, TSV, semicolon) into a [`Grid`]
//! - Image decoding into a [`GrayFrame`]
//! - Directory scanning for batch image processing

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use image::DynamicImage;
use log::{debug, warn};
use thiserror::Error;

use super::frame::GrayFrame;
use super::grid::Grid;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Extensions accepted by [`find_images`].
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Guess the field delimiter from the first non-empty lines.
///
/// Tab wins over semicolon, semicolon over comma, when counts tie. Files with
/// none of the three are treated as comma-separated single columns.
pub fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let count = |needle: char| -> usize {
        sample
            .iter()
            .map(|line| line.chars().filter(|&c| c == needle).count())
            .sum()
    };

    let tabs = count('\t');
    let semicolons = count(';');
    let commas = count(',');

    if tabs > 0 && tabs >= semicolons && tabs >= commas {
        b'\t'
    } else if semicolons > 0 && semicolons >= commas {
        b';'
    } else {
        b','
    }
}

/// Parse delimited text into a grid.
pub fn parse_grid(text: &str) -> Result<Grid> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        "parsed {} rows with delimiter {:?}",
        rows.len(),
        delimiter as char
    );

    Ok(Grid::from_rows(rows))
}

/// Load a delimited-text plate export into a grid.
///
/// Bytes that are not valid UTF-8 (Latin-1 `°` or `µ` in instrument
/// preambles) are replaced rather than rejected.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid delimited text,
/// or contains no cells.
pub fn load_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        warn!("{}: replaced invalid UTF-8 bytes", path.display());
    }
    let grid = parse_grid(&text)?;

    if grid.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(grid)
}

/// Decode an image file and convert it to grayscale.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded, or decodes to a
/// zero-sized image.
pub fn load_gray_frame<P: AsRef<Path>>(path: P) -> Result<GrayFrame> {
    let path = path.as_ref();
    let decoded = image::open(path)?;
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);

    if width == 0 || height == 0 {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    // 8-bit grayscale files are already luma; everything else goes through RGBA.
    let frame = match decoded {
        DynamicImage::ImageLuma8(gray) => GrayFrame::from_luma(width, height, gray.into_raw()),
        other => GrayFrame::from_rgba(width, height, other.into_rgba8().as_raw()),
    };

    frame.ok_or_else(|| LoaderError::EmptyFile(path.to_path_buf()))
}

/// List image files in a directory, sorted by path.
pub fn find_images(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(LoaderError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        IMAGE_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
                    .unwrap_or(false)
        })
        .collect();

    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("Well,Time,OD\nA1,0,0.5\n"), b',');
        assert_eq!(sniff_delimiter("Well\tTime\tOD\nA1\t0\t0,5\n"), b'\t');
        assert_eq!(sniff_delimiter("Well;Time;OD\nA1;0;0,5\n"), b';');
        assert_eq!(sniff_delimiter("single\ncolumn\n"), b',');
    }

    #[test]
    fn test_parse_grid_tsv_with_bom() {
        let grid = parse_grid("\u{feff}Well\tTime\tOD\nA1\t0\t0.5\n").unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.cell(0, 0), "Well");
        assert_eq!(grid.cell(1, 2), "0.5");
    }

    #[test]
    fn test_load_grid_ragged_csv() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Plate 1").unwrap();
        writeln!(file, ",1,2,3").unwrap();
        writeln!(file, "A, 0.1,0.2,0.3").unwrap();
        file.flush().unwrap();

        let grid = load_grid(file.path())?;
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.cell(0, 3), "");
        assert_eq!(grid.cell(2, 1), "0.1");
        Ok(())
    }

    #[test]
    fn test_load_grid_empty_file() {
        let file = NamedTempFile::new().unwrap();
        match load_grid(file.path()) {
            Err(LoaderError::EmptyFile(_)) => {}
            other => panic!("Expected EmptyFile, got {:?}", other),
        }
    }

    #[test]
    fn test_load_grid_latin1_preamble() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Temperature 37\xb0C\nWell,Time,OD\nA1,0,0.5\n")
            .unwrap();
        file.flush().unwrap();

        let grid = load_grid(file.path())?;
        assert_eq!(grid.height(), 3);
        assert!(grid.cell(0, 0).starts_with("Temperature 37"));
        assert_eq!(grid.cell(1, 0), "Well");
        assert_eq!(grid.cell(2, 2), "0.5");
        Ok(())
    }

    #[test]
    fn test_load_gray_frame_luma_png() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");

        let mut img = image::GrayImage::new(4, 3);
        img.put_pixel(2, 1, image::Luma([77]));
        img.save(&path)?;

        let frame = load_gray_frame(&path)?;
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.get(2, 1), 77);
        assert_eq!(frame.get(0, 0), 0);
        Ok(())
    }

    #[test]
    fn test_load_gray_frame_png() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let mut img = image::RgbImage::new(3, 2);
        img.put_pixel(1, 1, image::Rgb([255, 255, 255]));
        img.save(&path)?;

        let frame = load_gray_frame(&path)?;
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.get(1, 1), 255);
        assert_eq!(frame.get(0, 0), 0);
        Ok(())
    }

    #[test]
    fn test_find_images_filters_and_sorts() -> Result<()> {
        let dir = tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.csv"] {
            fs::File::create(dir.path().join(name))?;
        }

        let images = find_images(dir.path())?;
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
        Ok(())
    }

    #[test]
    fn test_find_images_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(find_images(&dir.path().join("nope")).is_err());
    }
}
