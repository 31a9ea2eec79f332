//! Text grids and well-label parsing.
//!
//! A [`Grid`] is the decoded form of any delimited-text or spreadsheet export:
//! rows of trimmed string cells. Reads outside the grid yield an empty cell so
//! the layout heuristics can probe freely.

use std::sync::OnceLock;

use regex::Regex;

/// Row letter A-H followed by column 1-12, optionally zero-padded.
fn well_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Ha-h])(0?[1-9]|1[0-2])$").expect("well pattern is a valid regex")
    })
}

/// Returns the canonical form (`"A1"`) of a well label, or `None` if the text
/// is not a well on a 96-well plate.
///
/// Accepts `"A1"`, `"a01"`, `" H12 "`; rejects `"A13"`, `"I1"`, `"A001"`.
pub fn canonical_well(text: &str) -> Option<String> {
    let captures = well_pattern().captures(text.trim())?;
    let row = captures.get(1)?.as_str().to_ascii_uppercase();
    let column: u8 = captures.get(2)?.as_str().parse().ok()?;
    Some(format!("{}{}", row, column))
}

/// Returns the upper-cased plate row letter if the cell is a bare A-H letter.
pub fn row_letter(text: &str) -> Option<char> {
    let mut chars = text.trim().chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let upper = first.to_ascii_uppercase();
    ('A'..='H').contains(&upper).then_some(upper)
}

/// Parse a cell as a finite number. Empty, non-numeric, NaN and infinite
/// cells all yield `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rectangular grid of text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    /// Build a grid from rows, trimming cells and padding short rows so every
    /// row has the same number of columns.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.as_ref().trim().to_string()).collect())
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Self { rows, width }
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell text, or `""` outside the grid.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", String::as_str)
    }

    /// Cells of one row, or an empty slice outside the grid.
    #[inline]
    pub fn row(&self, row: usize) -> &[String] {
        self.rows.get(row).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_well_accepts_padded_and_lowercase() {
        assert_eq!(canonical_well("A1").as_deref(), Some("A1"));
        assert_eq!(canonical_well("A01").as_deref(), Some("A1"));
        assert_eq!(canonical_well("h12").as_deref(), Some("H12"));
        assert_eq!(canonical_well("  c7 ").as_deref(), Some("C7"));
    }

    #[test]
    fn test_canonical_well_rejects_off_plate() {
        assert_eq!(canonical_well("A13"), None);
        assert_eq!(canonical_well("I1"), None);
        assert_eq!(canonical_well("A0"), None);
        assert_eq!(canonical_well("A001"), None);
        assert_eq!(canonical_well("Well"), None);
        assert_eq!(canonical_well(""), None);
    }

    #[test]
    fn test_row_letter() {
        assert_eq!(row_letter("a"), Some('A'));
        assert_eq!(row_letter(" H "), Some('H'));
        assert_eq!(row_letter("I"), None);
        assert_eq!(row_letter("AB"), None);
        assert_eq!(row_letter(""), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 0.5 "), Some(0.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("OD600"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_grid_pads_ragged_rows() {
        let grid = Grid::from_rows(vec![vec!["a", " b "], vec!["c"]]);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.cell(0, 1), "b");
        assert_eq!(grid.cell(1, 1), "");
        assert_eq!(grid.cell(5, 5), "");
        assert!(grid.row(9).is_empty());
    }
}
