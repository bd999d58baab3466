// src/core/analysis/stereo.rs
//
// Per-sample stereo field analysis: pan and phase correlation from the
// angle of the (side, mid) vector.

use std::f64::consts::PI;

use crate::core::frame::{Frame, StereoSample};

/// Pan and correlation of a single stereo sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldPoint {
    /// -1 = hard left, 0 = centre, +1 = hard right
    pub pan: f32,
    /// +1 = in phase (mono), -1 = anti-phase
    pub correlation: f32,
}

impl FieldPoint {
    /// Value reported for digital silence, where the angle is undefined.
    /// Silence is treated as a centred mono signal of zero amplitude.
    pub const SILENCE: Self = Self {
        pan: 0.0,
        correlation: 1.0,
    };
}

/// Analyze one stereo sample.
///
/// With `x = side` and `y = mid`:
/// - pan comes from `atan2(x, -y)`, wrapped to one turn, spread over
///   `[-2, 2)` and folded back into `[-1, 1]` so that in-phase and anti-phase
///   signals with the same balance read the same pan;
/// - correlation comes from `atan2(x, y)`: 0 or ±π (pure mid) gives +1,
///   ±π/2 (pure side) gives -1, linear in angle between.
///
/// Non-finite input and exact silence resolve to [`FieldPoint::SILENCE`].
pub fn analyze_sample(sample: StereoSample) -> FieldPoint {
    let x = sample.side() as f64;
    let y = sample.mid() as f64;

    // atan2(±0, ±0) depends on the zero signs, so pin the convention here
    if !(x.is_finite() && y.is_finite()) || (x == 0.0 && y == 0.0) {
        return FieldPoint::SILENCE;
    }

    let mut pan = x.atan2(-y) / PI + 0.5;
    pan -= pan.floor();
    let mut pan = pan * 4.0 - 2.0;
    if pan < -1.0 {
        pan = -2.0 - pan;
    }
    if pan > 1.0 {
        pan = 2.0 - pan;
    }

    let correlation = (1.0 - (x.atan2(y) / PI * 2.0).abs()).abs() * 2.0 - 1.0;

    FieldPoint {
        pan: (pan as f32).clamp(-1.0, 1.0),
        correlation: (correlation as f32).clamp(-1.0, 1.0),
    }
}

/// Build a window frame from a sample and its arrival time
pub fn analyze_frame(sample: StereoSample, timestamp: f64) -> Frame {
    let point = analyze_sample(sample);
    Frame {
        sample,
        timestamp,
        pan: point.pan,
        correlation: point.correlation,
    }
}

/// Arithmetic mean of pan and correlation over a set of frames.
/// `None` when there are no frames.
pub fn mean_field<'a, I>(frames: I) -> Option<FieldPoint>
where
    I: IntoIterator<Item = &'a Frame>,
{
    let mut count = 0usize;
    let mut pan_sum = 0.0f64;
    let mut corr_sum = 0.0f64;

    for frame in frames {
        count += 1;
        pan_sum += frame.pan as f64;
        corr_sum += frame.correlation as f64;
    }

    if count == 0 {
        return None;
    }

    Some(FieldPoint {
        pan: (pan_sum / count as f64) as f32,
        correlation: (corr_sum / count as f64) as f32,
    })
}
