//! PhaseScope - real-time stereo phase scope
//!
//! The analysis kernel behind a goniometer display: a rolling window of
//! stereo frames rendered as a decaying phosphor density field, with
//! correlation and pan meters and an adaptive display gain.
//!
//! ## Features
//!
//! - **Goniometer field**: mid on the vertical axis, side on the horizontal,
//!   with linear fade over the display window
//! - **Correlation and pan meters**: window means, with an explicit "no data"
//!   state for an empty window
//! - **Adaptive gain**: hysteretic 6 dB steps driven by the 99th-percentile
//!   block peak, smoothed toward the goal
//! - **Manual gain**: fixed levels from 0 to -24 dB in 3 dB steps
//! - **Sources**: lock-free block hand-off from a playback thread, decoded
//!   files, synthetic test tones
//!
//! ## Module Structure
//!
//! - `core` - Frames, analysis stages, gain control, engine, sources
//! - `cli` - Command-line interface
//! - `config` - Tuning constants and the gain selector
//! - `error` - Error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phasescope::config::{GainLevel, ScopeConfig};
//! use phasescope::core::{ToneKind, ToneSpec, VisualizationEngine};
//!
//! let mut engine = VisualizationEngine::new(ScopeConfig::default(), GainLevel::Adaptive)?;
//! let block = ToneSpec::new(ToneKind::InPhase, 48_000).generate(128);
//! let frame = engine.tick(&block, 0.0, 128.0 / 48_000.0);
//!
//! println!("correlation {:?}, gain {}", frame.correlation, frame.gain_label);
//! frame.render().save("scope.png")?;
//! ```

// Scope pipeline
pub mod core;

// Command-line interface
pub mod cli;

// Tuning constants and gain selector
pub mod config;

// Error types
pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{GainLevel, ScopeConfig};
pub use core::{
    decode_stereo, AudioSource, ClipSource, DensityAccumulator, FieldPoint, Frame,
    GainController, LiveSource, NullSource, SampleWindow, ScopeFrame, StereoSample, StreamSource,
    ToneKind, ToneSpec, VisualizationEngine,
};
pub use error::ScopeError;
