//! Stereo analysis stages
//!
//! - Stereo field analysis (per-sample pan and phase correlation)
//! - Peak tracking (rolling block peaks for the gain loop)

mod peak;
mod stereo;

pub use peak::{PeakBlock, PeakTracker};
pub use stereo::{analyze_frame, analyze_sample, mean_field, FieldPoint};
