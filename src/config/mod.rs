//! Configuration types for the plate pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading, saving or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the grid normalizer heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Rows inspected when looking for a plate block or header row
    #[serde(default = "default_max_scan_rows")]
    pub max_scan_rows: usize,

    /// Numeric columns read after the row letter in a plate matrix
    #[serde(default = "default_plate_columns")]
    pub plate_columns: usize,

    /// Data rows sampled when testing for a time-first wide layout
    #[serde(default = "default_wide_sample_rows")]
    pub wide_sample_rows: usize,

    /// Minimum sampled rows with a numeric first cell
    #[serde(default = "default_wide_min_numeric_rows")]
    pub wide_min_numeric_rows: usize,

    /// Fraction of sampled rows that must have a numeric first cell
    #[serde(default = "default_wide_numeric_fraction")]
    pub wide_numeric_fraction: f64,

    /// Subtract each well's minimum before fitting
    #[serde(default = "default_subtract_baseline")]
    pub subtract_baseline: bool,
}

fn default_max_scan_rows() -> usize {
    120
}

fn default_plate_columns() -> usize {
    12
}

fn default_wide_sample_rows() -> usize {
    12
}

fn default_wide_min_numeric_rows() -> usize {
    3
}

fn default_wide_numeric_fraction() -> f64 {
    0.6
}

fn default_subtract_baseline() -> bool {
    true
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_scan_rows: default_max_scan_rows(),
            plate_columns: default_plate_columns(),
            wide_sample_rows: default_wide_sample_rows(),
            wide_min_numeric_rows: default_wide_min_numeric_rows(),
            wide_numeric_fraction: default_wide_numeric_fraction(),
            subtract_baseline: default_subtract_baseline(),
        }
    }
}

/// Configuration for exponential growth fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Minimum strictly positive readings a well needs to be fitted
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

fn default_min_points() -> usize {
    4
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_points: default_min_points(),
        }
    }
}

impl GrowthConfig {
    /// Reject parameters the fitter cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.min_points < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_points must be at least 2, got {}",
                self.min_points
            )));
        }
        Ok(())
    }
}

/// Configuration for blot lane quantification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Number of vertical lanes the image is split into
    #[serde(default = "default_lane_count")]
    pub lane_count: usize,

    /// 1-indexed lane used as the relative-density denominator
    #[serde(default = "default_control_lane")]
    pub control_lane: usize,
}

fn default_lane_count() -> usize {
    6
}

fn default_control_lane() -> usize {
    1
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            lane_count: default_lane_count(),
            control_lane: default_control_lane(),
        }
    }
}

impl LaneConfig {
    /// Reject lane layouts outside `lane_count >= 2` and `1 <= control_lane <= lane_count`.
    pub fn validate(&self) -> Result<()> {
        if self.lane_count < 2 {
            return Err(ConfigError::Invalid(format!(
                "lane_count must be at least 2, got {}",
                self.lane_count
            )));
        }
        if self.control_lane < 1 || self.control_lane > self.lane_count {
            return Err(ConfigError::Invalid(format!(
                "control_lane must be within 1..={}, got {}",
                self.lane_count, self.control_lane
            )));
        }
        Ok(())
    }
}

/// Configuration for colony segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyConfig {
    /// Pixels brighter than this are foreground
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Components smaller than this many pixels are discarded as noise
    #[serde(default = "default_min_area")]
    pub min_area: usize,
}

fn default_threshold() -> u8 {
    128
}

fn default_min_area() -> usize {
    crate::processors::colonies::MIN_COLONY_AREA
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_area: default_min_area(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub growth: GrowthConfig,

    #[serde(default)]
    pub lanes: LaneConfig,

    #[serde(default)]
    pub colonies: ColonyConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.normalizer.max_scan_rows, 120);
        assert_eq!(config.growth.min_points, 4);
        assert_eq!(config.colonies.min_area, 18);
        assert!(config.normalizer.subtract_baseline);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("colonies:\n  threshold: 90\n").unwrap();
        assert_eq!(config.colonies.threshold, 90);
        assert_eq!(config.colonies.min_area, 18);
        assert_eq!(config.lanes.lane_count, 6);
    }

    #[test]
    fn test_negative_threshold_rejected_by_yaml() {
        let parsed: std::result::Result<PipelineConfig, _> =
            serde_yaml::from_str("colonies:\n  threshold: -5\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.lanes.lane_count = 10;
        config.lanes.control_lane = 3;
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.lanes.lane_count, 10);
        assert_eq!(loaded.lanes.control_lane, 3);
    }

    #[test]
    fn test_lane_config_validation() {
        assert!(LaneConfig::default().validate().is_ok());

        let too_few = LaneConfig {
            lane_count: 1,
            control_lane: 1,
        };
        assert!(too_few.validate().is_err());

        let bad_control = LaneConfig {
            lane_count: 4,
            control_lane: 5,
        };
        assert!(bad_control.validate().is_err());

        let zero_control = LaneConfig {
            lane_count: 4,
            control_lane: 0,
        };
        assert!(zero_control.validate().is_err());
    }

    #[test]
    fn test_growth_config_validation() {
        assert!(GrowthConfig::default().validate().is_ok());
        assert!(GrowthConfig { min_points: 1 }.validate().is_err());
    }
}
