#![allow(dead_code)]

use std::path::{Path, PathBuf};
use uuid::Uuid;

use phasescope::StereoSample;

pub const RATE: u32 = 48_000;
pub const BLOCK: usize = 128;

/// Unique path in the system temp directory
pub fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("phasescope-{}.{}", Uuid::new_v4(), extension))
}

/// Removes the file when dropped
pub struct TempFile(pub PathBuf);

impl TempFile {
    pub fn new(extension: &str) -> Self {
        TempFile(temp_path(extension))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

pub fn sine(frames: usize, freq: f32, amplitude: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / RATE as f32).sin())
        .collect()
}

pub fn in_phase(frames: usize, amplitude: f32) -> Vec<StereoSample> {
    sine(frames, 440.0, amplitude)
        .into_iter()
        .map(StereoSample::mono)
        .collect()
}

pub fn anti_phase(frames: usize, amplitude: f32) -> Vec<StereoSample> {
    sine(frames, 440.0, amplitude)
        .into_iter()
        .map(|s| StereoSample::new(s, -s))
        .collect()
}

pub fn hard_left(frames: usize, amplitude: f32) -> Vec<StereoSample> {
    sine(frames, 440.0, amplitude)
        .into_iter()
        .map(|s| StereoSample::new(s, 0.0))
        .collect()
}

/// Seconds spanned by `frames` at the test rate
pub fn span(frames: usize) -> f64 {
    frames as f64 / RATE as f64
}

/// Write 16-bit PCM WAV from per-frame channel values
pub fn write_wav(path: &Path, frames: &[Vec<f32>], channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for frame in frames {
        assert_eq!(frame.len(), channels as usize);
        for &value in frame {
            writer
                .write_sample((value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
    }
    writer.finalize().unwrap();
}

pub fn write_stereo_wav(path: &Path, samples: &[StereoSample]) {
    let frames: Vec<Vec<f32>> = samples.iter().map(|s| vec![s.left, s.right]).collect();
    write_wav(path, &frames, 2);
}

pub fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}
