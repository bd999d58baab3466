// src/core/window.rs
//
// Rolling, time-ordered store of analysed stereo frames.

use std::collections::VecDeque;

use super::analysis::{analyze_frame, mean_field, FieldPoint};
use super::frame::{Frame, StereoSample};

/// Bounded window of recent frames.
///
/// Frames arrive in chronological blocks, so insertion order is timestamp
/// order and eviction only ever pops from the front. A frame whose age is
/// exactly the retention is kept; it is dropped once it is strictly older.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    frames: VecDeque<Frame>,
    retention: f64,
}

impl SampleWindow {
    pub fn new(retention: f64) -> Self {
        Self {
            frames: VecDeque::new(),
            retention,
        }
    }

    /// Preallocate for an expected steady-state frame count
    pub fn with_capacity(retention: f64, capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            retention,
        }
    }

    pub fn retention(&self) -> f64 {
        self.retention
    }

    /// Append a block, spacing its timestamps evenly over `[t_start, t_end)`.
    /// An empty block is a no-op.
    pub fn ingest(&mut self, block: &[StereoSample], t_start: f64, t_end: f64) {
        if block.is_empty() {
            return;
        }

        let step = (t_end - t_start) / block.len() as f64;
        self.frames.reserve(block.len());
        for (i, sample) in block.iter().enumerate() {
            let timestamp = t_start + step * i as f64;
            self.frames.push_back(analyze_frame(sample.sanitized(), timestamp));
        }
    }

    /// Drop every frame with `now - timestamp > retention`. Returns the number dropped.
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.frames.len();
        while let Some(front) = self.frames.front() {
            if now - front.timestamp > self.retention {
                self.frames.pop_front();
            } else {
                break;
            }
        }
        before - self.frames.len()
    }

    /// Read-only view of the frames currently retained, oldest first
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = &Frame> + Clone + '_ {
        self.frames.iter()
    }

    /// Mean pan/correlation over the retained frames, `None` when empty
    pub fn mean_field(&self) -> Option<FieldPoint> {
        mean_field(self.frames.iter())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
