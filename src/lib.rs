//! Analysis pipeline for microplate reader exports and lab images.
//!
//! This crate provides tools for:
//! - Normalizing arbitrary plate-reader exports into tidy (well, time, value) rows
//! - Attaching plate-map groups and subtracting per-well baselines
//! - Fitting exponential growth rates per well
//! - Quantifying blot lanes against a control lane
//! - Counting bacterial colonies by connected-component segmentation
//!
//! # Example
//!
//! ```no_run
//! use plate_pipeline::{processors::tabular::process_table_file, PipelineConfig};
//!
//! let report = process_table_file("plate.csv".as_ref(), None, &PipelineConfig::default()).unwrap();
//! for fit in &report.fits {
//!     println!("{}: {:.3}/h", fit.well, fit.growth_rate);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{ColonyConfig, GrowthConfig, LaneConfig, NormalizerConfig, PipelineConfig};
pub use core::records::{ColonyResult, GrowthFit, LaneResult, TidyRecord, TidySet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
