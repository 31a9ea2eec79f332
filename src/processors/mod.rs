//! Data processing modules.

pub mod baseline;
pub mod colonies;
pub mod growth;
pub mod lanes;
pub mod metadata;
pub mod normalize;
pub mod tabular;

// Re-export key types for convenience
pub use baseline::subtract_baseline;
pub use colonies::{count_colonies, count_colonies_batch, process_colony_image, segment_colonies};
pub use growth::{fit_growth, linear_regression};
pub use lanes::{lane_bounds, process_lane_image, quantify_lanes};
pub use metadata::{merge_metadata, read_plate_map};
pub use normalize::{normalize_grid, GridLayout};
pub use tabular::{process_table_file, run_tabular, TabularReport};
