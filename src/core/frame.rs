// src/core/frame.rs
//
// Stereo sample and timestamped frame types shared by every stage.

/// One stereo sample pair as delivered by an audio source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoSample {
    pub left: f32,
    pub right: f32,
}

impl StereoSample {
    pub const SILENCE: Self = Self { left: 0.0, right: 0.0 };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same sample on both channels
    pub fn mono(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Replace non-finite channel values with silence
    pub fn sanitized(self) -> Self {
        let clean = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self::new(clean(self.left), clean(self.right))
    }

    /// Side (difference) component
    pub fn side(&self) -> f32 {
        (self.left - self.right) / 2.0
    }

    /// Mid (sum) component
    pub fn mid(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl From<(f32, f32)> for StereoSample {
    fn from((left, right): (f32, f32)) -> Self {
        Self::new(left, right)
    }
}

/// A stereo sample placed on the session clock, with its derived field metrics.
/// Never mutated after it enters the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub sample: StereoSample,
    /// Monotonic session time in seconds
    pub timestamp: f64,
    /// Stereo balance in [-1, 1], -1 = hard left
    pub pan: f32,
    /// Phase coherence in [-1, 1], +1 = mono
    pub correlation: f32,
}

/// Split interleaved samples into stereo pairs. Mono input is duplicated to
/// both channels; channels past the second are ignored.
pub fn frames_from_interleaved(samples: &[f32], channels: usize) -> Vec<StereoSample> {
    match channels {
        0 => Vec::new(),
        1 => samples.iter().map(|&s| StereoSample::mono(s)).collect(),
        n => samples
            .chunks_exact(n)
            .map(|chunk| StereoSample::new(chunk[0], chunk[1]))
            .collect(),
    }
}
