//! Value objects passed between pipeline stages.

/// One (well, time, value) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRecord {
    /// Canonical well label, e.g. `"B7"`.
    pub well: String,
    pub time: f64,
    pub value: f64,
    /// Sample group attached by the metadata merger.
    pub group: Option<String>,
}

impl TidyRecord {
    pub fn new(well: impl Into<String>, time: f64, value: f64) -> Self {
        Self {
            well: well.into(),
            time,
            value,
            group: None,
        }
    }
}

/// A tidy record set together with the diagnostic notes collected while
/// building it.
///
/// Each tabular stage takes a set by value and hands back a replacement, so
/// no two stages ever share a mutable view of the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidySet {
    pub records: Vec<TidyRecord>,
    pub notes: Vec<String>,
}

impl TidySet {
    pub fn new(records: Vec<TidyRecord>, notes: Vec<String>) -> Self {
        Self { records, notes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a diagnostic note.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Number of distinct wells.
    pub fn well_count(&self) -> usize {
        let mut wells: Vec<&str> = self.records.iter().map(|r| r.well.as_str()).collect();
        wells.sort_unstable();
        wells.dedup();
        wells.len()
    }
}

/// Exponential growth parameters for one well.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthFit {
    pub well: String,
    /// Slope of `ln(value)` against time.
    pub growth_rate: f64,
    pub r_squared: f64,
    /// Fitted `ln(value)` at time zero.
    pub intercept: f64,
    /// Readings used in the fit.
    pub points: usize,
    /// `ln 2 / growth_rate`; absent for flat or declining wells.
    pub doubling_time: Option<f64>,
}

/// Integrated darkness of one blot lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneResult {
    /// 1-indexed lane number.
    pub lane_index: usize,
    /// First column of the lane.
    pub x_start: usize,
    /// One past the last column of the lane.
    pub x_end: usize,
    pub integrated_intensity: f64,
    /// Intensity relative to the control lane; `None` when the control lane
    /// has no positive signal.
    pub relative_density: Option<f64>,
}

/// One connected foreground region that passed the area filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyResult {
    /// 1-based id in discovery order.
    pub colony_id: usize,
    pub area_pixels: usize,
    pub centroid_x: f64,
    pub centroid_y: f64,
}
