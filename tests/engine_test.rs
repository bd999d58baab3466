// tests/engine_test.rs
//
// End-to-end behaviour of the scope engine through the public API.

mod test_utils;

use phasescope::config::{GainLevel, ScopeConfig};
use phasescope::core::analysis::analyze_sample;
use phasescope::core::{ClipSource, VisualizationEngine};
use phasescope::StereoSample;
use test_utils::*;

fn engine(level: GainLevel) -> VisualizationEngine {
    VisualizationEngine::new(ScopeConfig::default(), level).unwrap()
}

#[test]
fn test_in_phase_round_trip() {
    let mut engine = engine(GainLevel::Adaptive);
    let block = in_phase(BLOCK, 0.5);
    let frame = engine.tick(&block, 0.0, span(BLOCK));

    assert!(approx(frame.correlation.unwrap(), 1.0, 1e-6));
    assert!(approx(frame.pan.unwrap(), 0.0, 1e-6));
    assert_eq!(frame.image.len(), 320 * 320 * 4);

    let centre = frame.size / 2;
    for (i, pixel) in frame.image.chunks_exact(4).enumerate() {
        assert_eq!(&pixel[..3], &[255u8, 255, 255]);
        if pixel[3] > 0 {
            assert_eq!(i % frame.size, centre);
        }
    }
}

#[test]
fn test_anti_phase_and_hard_left() {
    let mut engine = engine(GainLevel::Manual(0.0));
    let block = anti_phase(BLOCK, 0.5);
    let frame = engine.tick(&block[1..], 0.0, span(BLOCK - 1));
    assert!(approx(frame.correlation.unwrap(), -1.0, 1e-6));

    // Let the anti-phase frames age out before switching signal
    let mut t = span(BLOCK - 1);
    engine.tick(&[], t, t + 0.2);
    t += 0.2;
    let block = hard_left(BLOCK, 0.5);
    let frame = engine.tick(&block[1..], t, t + span(BLOCK - 1));
    assert!(approx(frame.pan.unwrap(), -1.0, 1e-6));
}

#[test]
fn test_field_ranges_over_many_inputs() {
    let values = [-1.0f32, -0.7, -0.01, 0.0, 0.01, 0.3, 1.0, 4.0];
    for &l in &values {
        for &r in &values {
            let point = analyze_sample(StereoSample::new(l, r));
            assert!((-1.0..=1.0).contains(&point.pan), "pan {} for ({}, {})", point.pan, l, r);
            assert!(
                (-1.0..=1.0).contains(&point.correlation),
                "correlation {} for ({}, {})",
                point.correlation,
                l,
                r
            );
        }
    }
}

#[test]
fn test_window_holds_one_tenth_second() {
    let mut engine = engine(GainLevel::Adaptive);
    let mut source = ClipSource::new("tone", in_phase(RATE as usize, 0.5));

    let mut t = 0.0;
    for _ in 0..100 {
        let mut block = Vec::new();
        phasescope::AudioSource::pull(&mut source, BLOCK, &mut block).unwrap();
        engine.tick(&block, t, t + span(BLOCK));
        t += span(BLOCK);
    }

    for frame in engine.window().snapshot() {
        assert!(t - frame.timestamp <= 0.1 + 1e-9);
    }
    // 0.1 s at 48 kHz, give or take one frame at the boundary
    let len = engine.window().len() as i64;
    assert!((len - 4800).abs() <= 1, "window {}", len);
}

#[test]
fn test_gain_selector_switch() {
    let mut engine = engine(GainLevel::Manual(-6.0));
    let block = in_phase(BLOCK, 0.9);

    let mut t = 0.0;
    for _ in 0..1000 {
        engine.tick(&block, t, t + span(BLOCK));
        t += span(BLOCK);
    }
    // ~2.7 s of smoothing: close enough to snap
    assert_eq!(engine.gain().amp(), -6.0);
    assert_eq!(engine.frame().gain_label, "-6.0 dB");

    engine.set_gain_level(GainLevel::Adaptive);
    for _ in 0..10 {
        engine.tick(&block, t, t + span(BLOCK));
        t += span(BLOCK);
    }
    // 0.9 peaks sit above -6 dB full scale: goal steps up to the ceiling
    assert_eq!(engine.gain().amp_goal(), 0.0);
    assert!(engine.frame().gain_label.ends_with(" <adaptive>"));
}

#[test]
fn test_quiet_signal_steps_gain_down_to_floor() {
    let mut engine = engine(GainLevel::Manual(0.0));
    let block = in_phase(BLOCK, 0.9);
    let mut t = 0.0;
    engine.tick(&block, t, t + 1.0);
    t += 1.0;

    // Peaks older than the 10 s statistics window are forgotten
    engine.set_gain_level(GainLevel::Adaptive);
    let quiet = in_phase(BLOCK, 0.001);
    for _ in 0..20 {
        engine.tick(&quiet, t, t + 1.0);
        t += 1.0;
    }
    assert_eq!(engine.gain().amp_goal(), -24.0);
    // Ticks stamped 11..=21 s remain; the loud one at 1 s has aged out
    assert_eq!(engine.peaks().len(), 11);
}
