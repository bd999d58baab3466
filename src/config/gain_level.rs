// src/config/gain_level.rs
//
// Discrete gain selector: adaptive, or a manual full-scale level in 3 dB steps.

use std::fmt;
use std::str::FromStr;

use crate::error::ScopeError;

/// Number of manual levels on the selector (0 dB down to -24 dB)
pub const MANUAL_LEVELS: u8 = 9;

const MANUAL_STEP_DB: f64 = 3.0;

/// Gain selection driving the controller's goal
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GainLevel {
    /// Goal follows the recent peak statistics
    #[default]
    Adaptive,
    /// Goal pinned to a fixed level in dB
    Manual(f64),
}

impl GainLevel {
    /// Validated manual level: one of 0, -3, ..., -24 dB
    pub fn manual(db: f64) -> Result<Self, ScopeError> {
        let steps = -db / MANUAL_STEP_DB;
        let rounded = steps.round();
        if !db.is_finite()
            || (steps - rounded).abs() > 1e-9
            || rounded < 0.0
            || rounded >= MANUAL_LEVELS as f64
        {
            return Err(ScopeError::InvalidGainLevel(db));
        }
        // + 0.0 turns -0.0 into 0.0
        Ok(GainLevel::Manual(-rounded * MANUAL_STEP_DB + 0.0))
    }

    /// Map a selector position to a level: 0 is adaptive, n is -(n-1)*3 dB.
    /// Positions past the last level clamp to the quietest one.
    pub fn from_step(step: u8) -> Self {
        match step {
            0 => GainLevel::Adaptive,
            n => {
                let index = (n - 1).min(MANUAL_LEVELS - 1);
                GainLevel::Manual(-(index as f64) * MANUAL_STEP_DB + 0.0)
            }
        }
    }

    /// Selector position of this level. Manual levels outside the selector
    /// range map to the nearest end.
    pub fn step(&self) -> u8 {
        match self {
            GainLevel::Adaptive => 0,
            GainLevel::Manual(db) => {
                let index = (-db / MANUAL_STEP_DB)
                    .round()
                    .clamp(0.0, (MANUAL_LEVELS - 1) as f64);
                index as u8 + 1
            }
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, GainLevel::Adaptive)
    }

    /// Every selectable level in selector order
    pub fn all() -> Vec<Self> {
        (0..=MANUAL_LEVELS).map(Self::from_step).collect()
    }
}

impl fmt::Display for GainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GainLevel::Adaptive => write!(f, "adaptive"),
            GainLevel::Manual(db) => write!(f, "{} dB", db),
        }
    }
}

impl FromStr for GainLevel {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_lowercase();
        if text == "adaptive" || text == "auto" {
            return Ok(GainLevel::Adaptive);
        }
        let number = text.trim_end_matches("db").trim();
        let db: f64 = number
            .parse()
            .map_err(|_| ScopeError::InvalidConfig(format!("unrecognised gain level '{}'", s)))?;
        GainLevel::manual(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_step() {
        assert_eq!(GainLevel::from_step(0), GainLevel::Adaptive);
        assert_eq!(GainLevel::from_step(1), GainLevel::Manual(0.0));
        assert_eq!(GainLevel::from_step(3), GainLevel::Manual(-6.0));
        assert_eq!(GainLevel::from_step(9), GainLevel::Manual(-24.0));
        assert_eq!(GainLevel::from_step(40), GainLevel::Manual(-24.0));
    }

    #[test]
    fn test_step_round_trip() {
        for level in GainLevel::all() {
            assert_eq!(GainLevel::from_step(level.step()), level);
        }
        assert_eq!(GainLevel::all().len(), 10);
    }

    #[test]
    fn test_step_saturates_out_of_range_levels() {
        assert_eq!(GainLevel::Manual(-800.0).step(), MANUAL_LEVELS);
        assert_eq!(GainLevel::Manual(f64::NEG_INFINITY).step(), MANUAL_LEVELS);
        assert_eq!(GainLevel::Manual(12.0).step(), 1);
        assert_eq!(GainLevel::Manual(-7.0).step(), 3);
    }

    #[test]
    fn test_manual_validation() {
        assert!(GainLevel::manual(-9.0).is_ok());
        assert!(GainLevel::manual(-4.0).is_err());
        assert!(GainLevel::manual(3.0).is_err());
        assert!(GainLevel::manual(-27.0).is_err());
        assert!(GainLevel::manual(f64::NAN).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("adaptive".parse::<GainLevel>().unwrap(), GainLevel::Adaptive);
        assert_eq!("-12".parse::<GainLevel>().unwrap(), GainLevel::Manual(-12.0));
        assert_eq!("-6dB".parse::<GainLevel>().unwrap(), GainLevel::Manual(-6.0));
        assert_eq!("0".parse::<GainLevel>().unwrap(), GainLevel::Manual(0.0));
        assert!("loud".parse::<GainLevel>().is_err());
        assert!("-5".parse::<GainLevel>().is_err());
    }
}
