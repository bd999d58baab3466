// src/config/settings.rs
//
// Tuning constants for the scope core. Defaults reproduce the reference
// configuration (48 kHz, 128-frame blocks, 320px field, -24..0 dB gain).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScopeError};

/// Complete scope configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Seconds a frame stays visible in the density field and meters
    pub display_retention: f64,
    /// Seconds a block peak stays in the AGC statistics
    pub peak_retention: f64,
    /// Edge length of the square density grid in pixels
    pub size: usize,
    /// Fraction of `size` that full scale maps to, measured from the centre
    pub plot_scale: f64,
    /// Intensity deposited by a fresh frame
    pub deposit: f64,
    /// Frames pulled from the source per tick
    pub block_frames: usize,
    /// Nominal source sample rate, used by the offline clock and the tone generator
    pub sample_rate: u32,
    /// Scheduler period in seconds
    pub tick_interval: f64,
    pub gain_floor_db: f64,
    pub gain_ceiling_db: f64,
    /// Goal change per adaptive step
    pub adaptive_step_db: f64,
    /// Residual gain error left after one second of smoothing
    pub smoothing_residual: f64,
    /// Gain error below which the smoothed gain snaps to the goal
    pub snap_db: f64,
    /// Peak percentile the adaptive loop tracks (0..=100)
    pub percentile: f64,
    pub initial_gain_db: f64,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            display_retention: 0.1,
            peak_retention: 10.0,
            size: 320,
            plot_scale: 0.4,
            deposit: 0.5,
            block_frames: 128,
            sample_rate: 48_000,
            tick_interval: 0.001,
            gain_floor_db: -24.0,
            gain_ceiling_db: 0.0,
            adaptive_step_db: 6.0,
            smoothing_residual: 0.01,
            snap_db: 0.01,
            percentile: 99.0,
            initial_gain_db: -24.0,
        }
    }
}

impl ScopeConfig {
    /// Load a JSON config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ScopeError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("display_retention", self.display_retention),
            ("peak_retention", self.peak_retention),
            ("plot_scale", self.plot_scale),
            ("deposit", self.deposit),
            ("tick_interval", self.tick_interval),
            ("adaptive_step_db", self.adaptive_step_db),
            ("snap_db", self.snap_db),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScopeError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.size < 2 {
            return Err(ScopeError::InvalidConfig(format!(
                "size must be at least 2, got {}",
                self.size
            )));
        }
        if self.block_frames == 0 || self.sample_rate == 0 {
            return Err(ScopeError::InvalidConfig(
                "block_frames and sample_rate must be non-zero".to_string(),
            ));
        }
        if !(self.smoothing_residual > 0.0 && self.smoothing_residual < 1.0) {
            return Err(ScopeError::InvalidConfig(format!(
                "smoothing_residual must lie in (0, 1), got {}",
                self.smoothing_residual
            )));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(ScopeError::InvalidConfig(format!(
                "percentile must lie in [0, 100], got {}",
                self.percentile
            )));
        }
        if self.gain_floor_db > self.gain_ceiling_db {
            return Err(ScopeError::InvalidConfig(format!(
                "gain floor {} dB is above ceiling {} dB",
                self.gain_floor_db, self.gain_ceiling_db
            )));
        }
        Ok(())
    }

    /// Seconds covered by one full source block
    pub fn block_duration(&self) -> f64 {
        self.block_frames as f64 / self.sample_rate as f64
    }

    pub fn clamp_gain(&self, db: f64) -> f64 {
        db.clamp(self.gain_floor_db, self.gain_ceiling_db)
    }
}
