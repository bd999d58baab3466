//! Configuration module for phasescope

mod gain_level;
mod settings;

pub use gain_level::{GainLevel, MANUAL_LEVELS};
pub use settings::ScopeConfig;
