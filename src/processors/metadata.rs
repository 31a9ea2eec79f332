//! Joining a plate map (well -> group label) onto tidy records.

use std::collections::HashMap;

use log::{info, warn};

use crate::config::NormalizerConfig;
use crate::core::grid::{canonical_well, Grid};
use crate::core::records::TidySet;

use super::normalize::find_header_row;

const METADATA_KEYWORDS: &[&str] = &["well", "group", "condition", "sample"];
const WELL_KEYWORDS: &[&str] = &["well"];
const GROUP_KEYWORDS: &[&str] = &["group", "condition", "sample"];

/// Build the well -> group map from a metadata grid.
///
/// The header is searched within the first `max_rows` rows. Returns `None`
/// when the well or the group column cannot be located. Duplicate wells keep
/// the last non-empty label seen; a blank group cell means "no label" and
/// never clears an earlier one.
pub fn read_plate_map(grid: &Grid, max_rows: usize) -> Option<HashMap<String, String>> {
    let header_row = find_header_row(grid, METADATA_KEYWORDS, max_rows)?;
    let header = grid.row(header_row);

    let lower: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
    let well_col = lower
        .iter()
        .position(|c| WELL_KEYWORDS.iter().any(|k| c.contains(k)))?;
    let group_col = lower
        .iter()
        .enumerate()
        .position(|(i, c)| i != well_col && GROUP_KEYWORDS.iter().any(|k| c.contains(k)))?;

    let mut map = HashMap::new();
    for r in header_row + 1..grid.height() {
        let Some(well) = canonical_well(grid.cell(r, well_col)) else {
            continue;
        };
        let group = grid.cell(r, group_col);
        if !group.is_empty() {
            map.insert(well, group.to_string());
        }
    }

    Some(map)
}

/// Attach group labels from a metadata grid to every matching record.
///
/// Records without a match keep whatever group they already had. When the
/// metadata has no usable well/group columns the set is returned unchanged
/// with a note.
pub fn merge_metadata(mut set: TidySet, metadata: &Grid, config: &NormalizerConfig) -> TidySet {
    let Some(map) = read_plate_map(metadata, config.max_scan_rows) else {
        warn!("metadata grid has no well/group columns");
        set.note(
            "Metadata not applied: could not find a Well column and a Group/Condition/Sample column.",
        );
        return set;
    };

    let mut labelled = 0usize;
    for record in &mut set.records {
        if let Some(group) = map.get(&record.well) {
            record.group = Some(group.clone());
            labelled += 1;
        }
    }

    info!(
        "metadata: {} wells mapped, {} records labelled",
        map.len(),
        labelled
    );
    set.note(format!(
        "Applied metadata for {} wells to {} of {} readings.",
        map.len(),
        labelled,
        set.len()
    ));
    set
}
