//! Digital Signal Processing utilities

pub mod stats;

pub use stats::{db_to_scale, percentile, stereo_peak};
