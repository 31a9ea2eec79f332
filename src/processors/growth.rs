//! Exponential growth-rate fitting.
//!
//! For every well with enough strictly positive readings, fits
//! `ln(value) = a + b * time` by ordinary least squares. The slope `b` is the
//! growth rate; `R²` measures how exponential the curve really is.
//!
//! Wells with too few positive readings are silently left out: absence from
//! the result is the "no fit" signal.

use std::collections::BTreeMap;

use log::debug;

use crate::config::GrowthConfig;
use crate::core::records::{GrowthFit, TidyRecord};

/// Ordinary least-squares line through `(x, y)` points.
///
/// Returns `(intercept, slope, r_squared)`, or `None` when all `x` are
/// identical. `r_squared` is 0 when all `y` are identical.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    let n = points.len() as f64;
    let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sx += x;
        sy += y;
        sxx += x * x;
        sxy += x * y;
    }

    let denom = n * sxx - sx * sx;
    if denom == 0.0 {
        return None;
    }

    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;

    let mean_y = sy / n;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for &(x, y) in points {
        let predicted = intercept + slope * x;
        ss_res += (y - predicted).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }

    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Some((intercept, slope, r_squared))
}

/// Fit one well's readings. `None` when fewer than `min_points` are positive
/// or every positive reading shares one time.
pub fn fit_well(well: &str, records: &[&TidyRecord], min_points: usize) -> Option<GrowthFit> {
    let mut points: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.value > 0.0)
        .map(|r| (r.time, r.value.ln()))
        .collect();

    if points.len() < min_points {
        return None;
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (intercept, growth_rate, r_squared) = linear_regression(&points)?;
    let doubling_time = (growth_rate > 0.0).then(|| std::f64::consts::LN_2 / growth_rate);

    Some(GrowthFit {
        well: well.to_string(),
        growth_rate,
        r_squared,
        intercept,
        points: points.len(),
        doubling_time,
    })
}

/// Fit every qualifying well, best `R²` first.
///
/// Ties in `R²` keep well-label order.
pub fn fit_growth(records: &[TidyRecord], config: &GrowthConfig) -> Vec<GrowthFit> {
    let mut by_well: BTreeMap<&str, Vec<&TidyRecord>> = BTreeMap::new();
    for record in records {
        by_well.entry(record.well.as_str()).or_default().push(record);
    }

    let mut fits: Vec<GrowthFit> = by_well
        .iter()
        .filter_map(|(well, rows)| {
            let fit = fit_well(well, rows, config.min_points);
            if fit.is_none() {
                debug!("{}: no fit ({} readings)", well, rows.len());
            }
            fit
        })
        .collect();

    fits.sort_by(|a, b| b.r_squared.total_cmp(&a.r_squared));

    debug!("fitted {} of {} wells", fits.len(), by_well.len());
    fits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_series(well: &str, times: &[f64], values: &[f64]) -> Vec<TidyRecord> {
        times
            .iter()
            .zip(values)
            .map(|(&t, &v)| TidyRecord::new(well, t, v))
            .collect()
    }

    #[test]
    fn test_doubling_series_rate_is_ln2() {
        let records = well_series("A1", &[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 4.0, 8.0]);
        let fits = fit_growth(&records, &GrowthConfig::default());

        assert_eq!(fits.len(), 1);
        let fit = &fits[0];
        assert_eq!(fit.well, "A1");
        assert!((fit.growth_rate - std::f64::consts::LN_2).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!(fit.intercept.abs() < 1e-9);
        assert_eq!(fit.points, 4);
        assert!((fit.doubling_time.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_input_gives_same_fit() {
        let records = well_series("A1", &[3.0, 0.0, 2.0, 1.0], &[8.0, 1.0, 4.0, 2.0]);
        let fits = fit_growth(&records, &GrowthConfig::default());
        assert!((fits[0].growth_rate - std::f64::consts::LN_2).abs() < 1e-9);
    }

    #[test]
    fn test_requires_four_positive_points() {
        // Baseline-corrected series: the zero reading does not count.
        let records = well_series("B2", &[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 3.0, 7.0]);
        assert!(fit_growth(&records, &GrowthConfig::default()).is_empty());

        let records = well_series("B2", &[0.0, 1.0, 2.0], &[1.0, 2.0, 4.0]);
        assert!(fit_growth(&records, &GrowthConfig::default()).is_empty());
    }

    #[test]
    fn test_identical_times_skipped() {
        let records = well_series("C1", &[5.0; 4], &[1.0, 2.0, 3.0, 4.0]);
        assert!(fit_growth(&records, &GrowthConfig::default()).is_empty());
    }

    #[test]
    fn test_flat_series_has_zero_r_squared() {
        let records = well_series("D4", &[0.0, 1.0, 2.0, 3.0], &[1.0; 4]);
        let fits = fit_growth(&records, &GrowthConfig::default());
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0].r_squared, 0.0);
        assert_eq!(fits[0].growth_rate, 0.0);
        assert!(fits[0].doubling_time.is_none());
    }

    #[test]
    fn test_sorted_by_r_squared_descending() {
        let mut records = well_series("A1", &[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 2.0, 8.0]);
        records.extend(well_series("H12", &[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 4.0, 8.0]));
        let fits = fit_growth(&records, &GrowthConfig::default());

        assert_eq!(fits.len(), 2);
        assert_eq!(fits[0].well, "H12");
        assert_eq!(fits[1].well, "A1");
        assert!(fits[0].r_squared > fits[1].r_squared);
    }

    #[test]
    fn test_min_points_is_configurable() {
        let records = well_series("E5", &[0.0, 1.0, 2.0], &[1.0, 2.0, 4.0]);
        let fits = fit_growth(&records, &GrowthConfig { min_points: 3 });
        assert_eq!(fits.len(), 1);
    }
}
