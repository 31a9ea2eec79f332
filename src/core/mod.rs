//! Core data types and I/O operations.

pub mod frame;
pub mod grid;
pub mod loaders;
pub mod records;
pub mod writers;

pub use frame::GrayFrame;
pub use grid::{canonical_well, Grid};
pub use loaders::{find_images, load_gray_frame, load_grid, LoaderError};
pub use records::{ColonyResult, GrowthFit, LaneResult, TidyRecord, TidySet};
pub use writers::{
    write_colonies_csv, write_fits_csv, write_lanes_csv, write_tidy_csv, WriteError,
};
