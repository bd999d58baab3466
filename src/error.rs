//! Error taxonomy for the scope core and its collaborators.
//!
//! Only construction-time problems (bad config, bad gain level, unwritable
//! snapshots) ever reach the user. Everything that can happen inside a tick is
//! recovered locally by the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    /// Audio pull failed or no device is selected
    #[error("audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// Manual gain outside the selector's discrete steps
    #[error("invalid gain level {0} dB (expected adaptive or 0, -3, ..., -24)")]
    InvalidGainLevel(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ScopeError>;
