// src/core/visualization/density.rs
//
// Goniometer density field: rasterizes the sample window into a decaying
// intensity grid and converts it to a white-phosphor RGBA buffer.

use image::RgbaImage;
use std::path::Path;

use crate::config::ScopeConfig;
use crate::core::dsp::stats::db_to_scale;
use crate::core::frame::{Frame, StereoSample};
use crate::error::Result;

/// Rebuilds the density grid from scratch every tick.
///
/// The grid is a pure function of the window contents, the current gain and
/// the current time: nothing is carried between ticks, so decay is exact and
/// the cost is bounded by the window length.
#[derive(Debug, Clone)]
pub struct DensityAccumulator {
    size: usize,
    plot_scale: f64,
    deposit: f64,
    retention: f64,
    grid: Vec<f32>,
    rgba: Vec<u8>,
}

impl DensityAccumulator {
    pub fn new(config: &ScopeConfig) -> Self {
        let cells = config.size * config.size;
        Self {
            size: config.size,
            plot_scale: config.plot_scale,
            deposit: config.deposit,
            retention: config.display_retention,
            grid: vec![0.0; cells],
            rgba: white_transparent(cells),
        }
    }

    /// Recompute the grid and RGBA buffer for time `now` at gain `amp_db`
    pub fn rebuild<'a, I>(&mut self, frames: I, amp_db: f64, now: f64)
    where
        I: IntoIterator<Item = &'a Frame>,
    {
        self.grid.fill(0.0);

        for frame in frames {
            let weight = self.decay_weight(now - frame.timestamp);
            if weight <= 0.0 {
                continue;
            }
            if let Some((row, col)) = self.cell(frame.sample, amp_db) {
                self.grid[row * self.size + col] += (weight * self.deposit) as f32;
            }
        }

        for (cell, pixel) in self.grid.iter().zip(self.rgba.chunks_exact_mut(4)) {
            pixel[3] = (cell * 255.0).min(255.0) as u8;
        }
    }

    /// Linear fade: 1 at arrival, 0 at the retention boundary
    pub fn decay_weight(&self, age: f64) -> f64 {
        (1.0 - age / self.retention).clamp(0.0, 1.0)
    }

    /// Side/mid components divided by the linear gain factor.
    /// Raising the gain by 6 dB halves both coordinates.
    pub fn scaled_coordinates(sample: StereoSample, amp_db: f64) -> (f64, f64) {
        let scale = db_to_scale(amp_db);
        (sample.side() as f64 / scale, sample.mid() as f64 / scale)
    }

    /// Grid cell for a sample: side runs left to right, mid runs bottom to
    /// top. Out-of-range points are pinned to the border.
    pub fn cell(&self, sample: StereoSample, amp_db: f64) -> Option<(usize, usize)> {
        let (x, y) = Self::scaled_coordinates(sample, amp_db);
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }

        let half = self.size as f64 / 2.0;
        let extent = self.size as f64 * self.plot_scale;
        let last = (self.size - 1) as f64;

        let col = (half + x * extent).round().clamp(0.0, last) as usize;
        let row = (half - y * extent).round().clamp(0.0, last) as usize;
        Some((row, col))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw intensities, row-major
    pub fn grid(&self) -> &[f32] {
        &self.grid
    }

    pub fn intensity(&self, row: usize, col: usize) -> f32 {
        self.grid[row * self.size + col]
    }

    pub fn total_intensity(&self) -> f64 {
        self.grid.iter().map(|&v| v as f64).sum()
    }

    /// SIZE x SIZE RGBA, row-major, RGB fixed white, alpha carries intensity
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn to_image(&self) -> RgbaImage {
        layer_image(&self.rgba, self.size)
    }

    /// Save the bare phosphor layer as PNG
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }
}

fn white_transparent(cells: usize) -> Vec<u8> {
    let mut rgba = vec![255u8; cells * 4];
    for pixel in rgba.chunks_exact_mut(4) {
        pixel[3] = 0;
    }
    rgba
}

pub(crate) fn layer_image(rgba: &[u8], size: usize) -> RgbaImage {
    RgbaImage::from_fn(size as u32, size as u32, |x, y| {
        let i = (y as usize * size + x as usize) * 4;
        image::Rgba([rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]])
    })
}
