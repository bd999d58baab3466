//! Statistical helpers for the peak tracker and gain loop

use crate::core::frame::StereoSample;

/// Largest absolute channel value over a stereo block, 0 for an empty block.
/// Non-finite channel values count as silence.
pub fn stereo_peak(block: &[StereoSample]) -> f32 {
    block
        .iter()
        .map(|s| s.sanitized().peak())
        .fold(0.0f32, f32::max)
}

/// Percentile (0..=100) with linear interpolation between order statistics.
///
/// Reorders `data` in place; selection is O(n), no full sort.
/// Returns `None` for empty input. NaNs sort last.
pub fn percentile(data: &mut [f32], pct: f64) -> Option<f32> {
    if data.is_empty() {
        return None;
    }

    let cmp = |a: &f32, b: &f32| a.total_cmp(b);
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (data.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;

    let (_, lo_value, upper) = data.select_nth_unstable_by(lo, cmp);
    let lo_value = *lo_value;

    if frac == 0.0 || upper.is_empty() {
        return Some(lo_value);
    }

    // Next order statistic is the smallest element above the split
    let hi_value = upper.iter().copied().min_by(cmp).unwrap_or(lo_value);
    Some(lo_value + ((hi_value - lo_value) as f64 * frac) as f32)
}

/// Full-scale factor for a display gain in dB, using 6 dB per doubling
pub fn db_to_scale(db: f64) -> f64 {
    (db / 6.0).exp2()
}
