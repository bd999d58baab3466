// src/core/analysis/peak.rs
//
// Rolling per-block peak history feeding the adaptive gain loop.

use std::collections::VecDeque;

use crate::core::dsp::stats::{percentile, stereo_peak};
use crate::core::frame::StereoSample;

/// Peak magnitude of one ingested block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBlock {
    pub peak: f32,
    pub timestamp: f64,
}

/// Time-ordered peak history with age-based eviction
#[derive(Debug, Clone)]
pub struct PeakTracker {
    blocks: VecDeque<PeakBlock>,
    retention: f64,
    percentile: f64,
    // Reused by the selection so the hot path does not allocate
    scratch: Vec<f32>,
}

impl PeakTracker {
    pub fn new(retention: f64, percentile: f64) -> Self {
        Self {
            blocks: VecDeque::new(),
            retention,
            percentile,
            scratch: Vec::new(),
        }
    }

    /// Record the block's peak stamped with `now`. An empty block records 0.
    pub fn record(&mut self, block: &[StereoSample], now: f64) {
        self.blocks.push_back(PeakBlock {
            peak: stereo_peak(block),
            timestamp: now,
        });
    }

    /// Drop every entry with `now - timestamp > retention`
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.blocks.len();
        while let Some(front) = self.blocks.front() {
            if now - front.timestamp > self.retention {
                self.blocks.pop_front();
            } else {
                break;
            }
        }
        before - self.blocks.len()
    }

    /// Configured percentile of the retained peaks (linear magnitudes),
    /// `None` when nothing is retained.
    pub fn percentile(&mut self) -> Option<f32> {
        self.percentile_at(self.percentile)
    }

    /// 99th-percentile peak regardless of configuration
    pub fn percentile99(&mut self) -> Option<f32> {
        self.percentile_at(99.0)
    }

    fn percentile_at(&mut self, pct: f64) -> Option<f32> {
        self.scratch.clear();
        self.scratch.extend(self.blocks.iter().map(|b| b.peak));
        percentile(&mut self.scratch, pct)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_takes_abs_max() {
        let mut tracker = PeakTracker::new(10.0, 99.0);
        tracker.record(
            &[StereoSample::new(0.1, -0.6), StereoSample::new(0.4, 0.2)],
            0.0,
        );
        tracker.record(&[], 0.001);

        let peaks: Vec<f32> = tracker.blocks.iter().map(|b| b.peak).collect();
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0] - 0.6).abs() < 1e-6);
        assert_eq!(peaks[1], 0.0);
    }

    #[test]
    fn test_non_finite_samples_keep_the_block_peak() {
        let mut tracker = PeakTracker::new(10.0, 99.0);
        tracker.record(
            &[
                StereoSample::new(0.5, 0.5),
                StereoSample::new(f32::INFINITY, 0.0),
                StereoSample::new(f32::NAN, -0.25),
            ],
            0.0,
        );
        assert_eq!(tracker.blocks[0].peak, 0.5);
        assert_eq!(tracker.percentile99(), Some(0.5));
    }

    #[test]
    fn test_empty_tracker_has_no_percentile() {
        let mut tracker = PeakTracker::new(10.0, 99.0);
        assert_eq!(tracker.percentile99(), None);
    }

    #[test]
    fn test_percentile_ignores_rare_spikes() {
        let mut tracker = PeakTracker::new(10.0, 99.0);
        for i in 0..1000 {
            let value = if i == 500 { 1.0 } else { 0.25 };
            tracker.record(&[StereoSample::mono(value)], i as f64 * 0.001);
        }
        let p = tracker.percentile99().unwrap();
        assert!((p - 0.25).abs() < 1e-6, "p99 {}", p);
    }

    #[test]
    fn test_prune_retention() {
        let mut tracker = PeakTracker::new(10.0, 99.0);
        tracker.record(&[StereoSample::mono(0.9)], 0.0);
        tracker.record(&[StereoSample::mono(0.1)], 5.0);

        assert_eq!(tracker.prune(10.0), 0);
        assert_eq!(tracker.prune(10.5), 1);
        assert_eq!(tracker.len(), 1);
        assert!((tracker.percentile99().unwrap() - 0.1).abs() < 1e-6);
    }
}
