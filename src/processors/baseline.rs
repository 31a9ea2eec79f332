//! Per-well baseline subtraction.

use std::collections::HashMap;

use log::info;

use crate::core::records::TidySet;

/// Subtract each well's minimum reading from all of its readings.
///
/// Skipped, with a note, when no well has readings at more than one distinct
/// time: a snapshot matrix (even one with repeated blocks at `time = 0`) would
/// otherwise be zeroed out. Applying the correction twice is the same as
/// applying it once.
pub fn subtract_baseline(mut set: TidySet) -> TidySet {
    let mut times: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut minimums: HashMap<&str, f64> = HashMap::new();

    for record in &set.records {
        times.entry(record.well.as_str()).or_default().push(record.time);
        minimums
            .entry(record.well.as_str())
            .and_modify(|m| *m = m.min(record.value))
            .or_insert(record.value);
    }

    let has_time_series = times.values_mut().any(|well_times| {
        well_times.sort_by(|a, b| a.total_cmp(b));
        well_times.dedup_by(|a, b| a.total_cmp(b).is_eq());
        well_times.len() > 1
    });

    if !has_time_series {
        set.note("Baseline subtraction skipped: no well has more than one time point.");
        return set;
    }

    let minimums: HashMap<String, f64> = minimums
        .into_iter()
        .map(|(well, min)| (well.to_string(), min))
        .collect();

    for record in &mut set.records {
        if let Some(min) = minimums.get(&record.well) {
            record.value -= min;
        }
    }

    info!("subtracted per-well baseline from {} wells", minimums.len());
    set.note(format!(
        "Subtracted each well's minimum reading ({} wells).",
        minimums.len()
    ));
    set
}
