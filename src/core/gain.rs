// src/core/gain.rs
//
// Display gain control: adaptive step controller driven by the peak
// percentile, or a fixed manual level, followed by exponential smoothing.

use log::debug;

use crate::config::{GainLevel, ScopeConfig};
use crate::core::dsp::stats::db_to_scale;

/// Gain state owned by the engine and advanced once per tick
#[derive(Debug, Clone)]
pub struct GainController {
    level: GainLevel,
    /// Smoothed gain actually applied to the display (dB)
    amp: f64,
    /// Target the smoothed gain chases (dB)
    amp_goal: f64,
    floor: f64,
    ceiling: f64,
    adaptive_step: f64,
    residual: f64,
    snap: f64,
}

impl GainController {
    pub fn new(config: &ScopeConfig, level: GainLevel) -> Self {
        let initial = config.clamp_gain(config.initial_gain_db);
        Self {
            level,
            amp: initial,
            amp_goal: initial,
            floor: config.gain_floor_db,
            ceiling: config.gain_ceiling_db,
            adaptive_step: config.adaptive_step_db,
            residual: config.smoothing_residual,
            snap: config.snap_db,
        }
    }

    /// Switch mode. The smoothed gain keeps its value and glides to the new goal.
    pub fn set_level(&mut self, level: GainLevel) {
        if level != self.level {
            debug!("gain level {} -> {}", self.level, level);
        }
        self.level = level;
    }

    pub fn level(&self) -> GainLevel {
        self.level
    }

    pub fn is_adaptive(&self) -> bool {
        self.level.is_adaptive()
    }

    /// Advance by `dt` seconds. `peak` is the current peak percentile
    /// (linear); `None` means no statistics, and the adaptive goal holds.
    pub fn step(&mut self, dt: f64, peak: Option<f32>) {
        match self.level {
            GainLevel::Manual(db) => self.amp_goal = db.clamp(self.floor, self.ceiling),
            GainLevel::Adaptive => {
                if let Some(p) = peak {
                    self.adapt_goal(p as f64);
                }
            }
        }
        self.smooth(dt);
    }

    fn adapt_goal(&mut self, peak: f64) {
        // Octaves between the peak and the goal's full-scale reference.
        // A zero peak gives -inf and steps the goal down.
        let smax = (peak / db_to_scale(self.amp_goal)).log2();
        let previous = self.amp_goal;

        if smax > 0.0 {
            self.amp_goal = (self.amp_goal + self.adaptive_step).min(self.ceiling);
        } else if smax < -1.0 {
            self.amp_goal = (self.amp_goal - self.adaptive_step).max(self.floor);
        }

        if self.amp_goal != previous {
            debug!(
                "adaptive gain goal {:.1} -> {:.1} dB (smax {:.2})",
                previous, self.amp_goal, smax
            );
        }
    }

    fn smooth(&mut self, dt: f64) {
        let cc = if dt > 0.0 {
            1.0 - self.residual.powf(dt)
        } else {
            0.0
        };
        self.amp = self.amp * (1.0 - cc) + self.amp_goal * cc;
        if (self.amp_goal - self.amp).abs() < self.snap {
            self.amp = self.amp_goal;
        }
    }

    /// Smoothed gain in dB
    pub fn amp(&self) -> f64 {
        self.amp
    }

    pub fn amp_goal(&self) -> f64 {
        self.amp_goal
    }

    /// e.g. "-12.0 dB <adaptive>"
    pub fn label(&self) -> String {
        let mut label = format!("{:.1} dB", self.amp + 0.0);
        if label == "-0.0 dB" {
            label = "0.0 dB".to_string();
        }
        if self.is_adaptive() {
            label.push_str(" <adaptive>");
        }
        label
    }
}
