// src/core/engine.rs
//
// Per-tick orchestration: ingest, prune, gain step, density rebuild, meters.

use image::RgbaImage;
use log::trace;

use super::analysis::{FieldPoint, PeakTracker};
use super::frame::StereoSample;
use super::gain::GainController;
use super::source::AudioSource;
use super::visualization::{layer_image, render_overlay, DensityAccumulator};
use super::window::SampleWindow;
use crate::config::{GainLevel, ScopeConfig};
use crate::error::{Result, ScopeError};

/// What the renderer reads after a tick
#[derive(Debug, Clone, Copy)]
pub struct ScopeFrame<'a> {
    /// SIZE x SIZE RGBA phosphor layer, row-major
    pub image: &'a [u8],
    pub size: usize,
    /// Frames taken in by the tick that produced this output
    pub ingested: usize,
    /// Mean correlation over the display window, `None` when the window is empty
    pub correlation: Option<f32>,
    /// Mean pan over the display window, `None` when the window is empty
    pub pan: Option<f32>,
    pub gain_label: &'a str,
    /// Smoothed gain in dB
    pub gain_db: f64,
}

impl ScopeFrame<'_> {
    /// Composite frame with graticule and meters
    pub fn render(&self) -> RgbaImage {
        render_overlay(self.image, self.size, self.correlation, self.pan)
    }

    /// The bare phosphor layer
    pub fn layer(&self) -> RgbaImage {
        layer_image(self.image, self.size)
    }
}

/// Owns every piece of mutable scope state; one instance per session.
///
/// Ticks must be issued sequentially with non-decreasing times. Nothing in
/// a tick blocks or fails: a source error becomes an empty block.
#[derive(Debug)]
pub struct VisualizationEngine {
    config: ScopeConfig,
    window: SampleWindow,
    peaks: PeakTracker,
    gain: GainController,
    density: DensityAccumulator,
    block: Vec<StereoSample>,
    last_tick: Option<f64>,
    field: Option<FieldPoint>,
    label: String,
}

impl VisualizationEngine {
    pub fn new(config: ScopeConfig, level: GainLevel) -> Result<Self> {
        config.validate()?;

        let expected = (config.display_retention * config.sample_rate as f64).ceil() as usize
            + config.block_frames;
        let gain = GainController::new(&config, level);
        let label = gain.label();

        Ok(Self {
            window: SampleWindow::with_capacity(config.display_retention, expected),
            peaks: PeakTracker::new(config.peak_retention, config.percentile),
            density: DensityAccumulator::new(&config),
            block: Vec::with_capacity(config.block_frames),
            last_tick: None,
            field: None,
            label,
            gain,
            config,
        })
    }

    /// Advance one tick with a block that arrived between `t_prev` and `t_now`
    pub fn tick(&mut self, block: &[StereoSample], t_prev: f64, t_now: f64) -> ScopeFrame<'_> {
        self.block.clear();
        self.block.extend_from_slice(block);
        self.advance(t_prev, t_now);
        self.frame()
    }

    /// Pull up to one block from `source` and tick at `now`.
    ///
    /// The previous tick time (or `now` on the first call) starts the
    /// interval. A pull failure yields an empty block and is handed back
    /// for the caller to log.
    pub fn poll(
        &mut self,
        source: &mut dyn AudioSource,
        now: f64,
    ) -> (ScopeFrame<'_>, Option<ScopeError>) {
        let t_prev = self.last_tick.unwrap_or(now).min(now);

        self.block.clear();
        let failure = match source.pull(self.config.block_frames, &mut self.block) {
            Ok(()) => {
                self.block.truncate(self.config.block_frames);
                None
            }
            Err(e) => {
                self.block.clear();
                Some(e)
            }
        };

        self.advance(t_prev, now);
        (self.frame(), failure)
    }

    fn advance(&mut self, t_prev: f64, t_now: f64) {
        self.window.ingest(&self.block, t_prev, t_now);
        self.peaks.record(&self.block, t_now);

        self.window.prune(t_now);
        self.peaks.prune(t_now);

        let peak = if self.gain.is_adaptive() {
            self.peaks.percentile()
        } else {
            None
        };
        self.gain.step(t_now - t_prev, peak);

        self.density
            .rebuild(self.window.snapshot(), self.gain.amp(), t_now);
        self.field = self.window.mean_field();
        self.label = self.gain.label();
        self.last_tick = Some(t_now);

        trace!(
            "tick {:.6}: {} frames in, window {}, peaks {}, gain {}",
            t_now,
            self.block.len(),
            self.window.len(),
            self.peaks.len(),
            self.label
        );
    }

    /// Output of the most recent tick
    pub fn frame(&self) -> ScopeFrame<'_> {
        ScopeFrame {
            image: self.density.rgba(),
            size: self.density.size(),
            ingested: self.block.len(),
            correlation: self.field.map(|f| f.correlation),
            pan: self.field.map(|f| f.pan),
            gain_label: &self.label,
            gain_db: self.gain.amp(),
        }
    }

    pub fn set_gain_level(&mut self, level: GainLevel) {
        self.gain.set_level(level);
    }

    pub fn gain(&self) -> &GainController {
        &self.gain
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn peaks(&self) -> &PeakTracker {
        &self.peaks
    }

    pub fn density(&self) -> &DensityAccumulator {
        &self.density
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn last_tick(&self) -> Option<f64> {
        self.last_tick
    }
}
