//! CLI argument model

use clap::Parser;
use std::path::PathBuf;

use crate::config::GainLevel;
use crate::core::source::ToneKind;

#[derive(Parser, Debug, Clone)]
#[command(name = "phasescope")]
#[command(about = "Stereo phase scope: goniometer, correlation and pan meters with adaptive gain")]
#[command(version)]
pub struct Args {
    /// Audio file to play through the scope
    #[arg(short, long, conflicts_with_all = ["tone", "silent"])]
    pub input: Option<PathBuf>,

    /// Synthetic test signal (in-phase, anti-phase, hard-left, hard-right, panned, noise)
    #[arg(short, long, default_value = "in-phase")]
    pub tone: ToneKind,

    /// Tone frequency in Hz
    #[arg(long, default_value = "440")]
    pub frequency: f32,

    /// Tone amplitude (linear, full scale = 1.0)
    #[arg(long, default_value = "0.5")]
    pub amplitude: f32,

    /// Balance for the panned tone, -1 (left) to 1 (right)
    #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
    pub pan: f32,

    /// No device: run the scope on an inactive source
    #[arg(long, conflicts_with = "tone")]
    pub silent: bool,

    /// Display gain: "adaptive" or one of 0, -3, ..., -24 dB
    #[arg(short, long, default_value = "adaptive", allow_hyphen_values = true)]
    pub gain: GainLevel,

    /// Seconds to run (defaults to the file length, or 2 s for tones)
    #[arg(short, long, value_parser = parse_duration, allow_hyphen_values = true)]
    pub duration: Option<f64>,

    /// Tick on the wall clock with a threaded playback driver
    #[arg(long)]
    pub realtime: bool,

    /// Write the final composited frame as PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Write the final bare phosphor layer as PNG
    #[arg(long)]
    pub raw_snapshot: Option<PathBuf>,

    /// JSON configuration file overriding the built-in constants
    #[arg(short, long, env = "PHASESCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_duration(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("duration must be a positive, finite number of seconds (got {})", s));
    }
    Ok(secs)
}

/// Where the frames come from
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    File(PathBuf),
    Tone(ToneKind),
    Silent,
}

impl Args {
    pub fn input_kind(&self) -> InputKind {
        if self.silent {
            InputKind::Silent
        } else if let Some(path) = &self.input {
            InputKind::File(path.clone())
        } else {
            InputKind::Tone(self.tone)
        }
    }
}
