// src/core/visualization/overlay.rs
//
// Offline composition of a complete scope frame: graticule, correlation
// bar, pan bar and the phosphor layer on a dark background.

use image::{Rgba, RgbaImage};

const BACKGROUND: [u8; 3] = [16, 16, 16];
const GRID: [u8; 3] = [64, 64, 64];
const PAN_FILL: [u8; 3] = [128, 128, 128];
const PAN_EDGE: [u8; 3] = [192, 192, 192];

// Correlation colour stops by vertical position (0 = top of track, 1 = bottom)
const CORR_BRIGHT: [[u8; 3]; 3] = [[0, 192, 0], [192, 192, 0], [192, 0, 0]];
const CORR_DIM: [[u8; 3]; 3] = [[0, 48, 0], [48, 48, 0], [48, 0, 0]];

/// Canvas with coordinates relative to the image centre, y pointing down
struct Canvas {
    img: RgbaImage,
    centre: f64,
}

impl Canvas {
    fn new(size: usize) -> Self {
        let [r, g, b] = BACKGROUND;
        Self {
            img: RgbaImage::from_pixel(size as u32, size as u32, Rgba([r, g, b, 255])),
            centre: size as f64 / 2.0,
        }
    }

    fn put(&mut self, x: f64, y: f64, color: [u8; 3]) {
        let px = (self.centre + x).floor();
        let py = (self.centre + y).floor();
        if px < 0.0 || py < 0.0 {
            return;
        }
        let (px, py) = (px as u32, py as u32);
        if px < self.img.width() && py < self.img.height() {
            self.img.put_pixel(px, py, Rgba([color[0], color[1], color[2], 255]));
        }
    }

    /// Two-pixel line, matching the 2px pen of the live display
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: [u8; 3]) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let (x, y) = (from.0 + dx * t, from.1 + dy * t);
            self.put(x, y, color);
            if dx.abs() >= dy.abs() {
                self.put(x, y - 1.0, color);
            } else {
                self.put(x - 1.0, y, color);
            }
        }
    }

    fn fill(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: impl Fn(f64) -> [u8; 3]) {
        let (xa, xb) = (x0.min(x1), x0.max(x1));
        let (ya, yb) = (y0.min(y1), y0.max(y1));
        let mut y = ya.floor();
        while y < yb {
            let c = color(y);
            let mut x = xa.floor();
            while x < xb {
                self.put(x, y, c);
                x += 1.0;
            }
            y += 1.0;
        }
    }

    fn outline(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: [u8; 3]) {
        self.line((x0, y0), (x1, y0), color);
        self.line((x1, y0), (x1, y1), color);
        self.line((x1, y1), (x0, y1), color);
        self.line((x0, y1), (x0, y0), color);
    }

    /// Blend a white-phosphor RGBA layer over the canvas
    fn blend_layer(&mut self, layer: &[u8]) {
        for (pixel, src) in self.img.pixels_mut().zip(layer.chunks_exact(4)) {
            let alpha = src[3] as f32 / 255.0;
            for c in 0..3 {
                let under = pixel.0[c] as f32;
                pixel.0[c] = (under + (src[c] as f32 - under) * alpha).round() as u8;
            }
        }
    }
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Colour at position `t` along the correlation track
fn gradient(stops: &[[u8; 3]; 3], t: f64) -> [u8; 3] {
    if t <= 0.5 {
        stops[0]
    } else if t <= 0.75 {
        lerp(stops[0], stops[1], (t - 0.5) / 0.25)
    } else {
        lerp(stops[1], stops[2], ((t - 0.75) / 0.25).min(1.0))
    }
}

/// Compose an opaque SIZE x SIZE frame from the phosphor layer and meters.
/// `None` meters draw empty tracks.
pub fn render_overlay(
    layer: &[u8],
    size: usize,
    correlation: Option<f32>,
    pan: Option<f32>,
) -> RgbaImage {
    let mut canvas = Canvas::new(size);
    let s = size as f64;
    let reach = 0.4 * s;

    // Graticule
    let diamond = [(-reach, 0.0), (0.0, -reach), (reach, 0.0), (0.0, reach)];
    for i in 0..diamond.len() {
        canvas.line(diamond[i], diamond[(i + 1) % diamond.len()], GRID);
    }
    canvas.line((-reach, 0.0), (reach, 0.0), GRID);
    canvas.line((0.0, -reach), (0.0, reach), GRID);
    canvas.line((-0.2 * s, -0.2 * s), (0.2 * s, 0.2 * s), GRID);
    canvas.line((-0.2 * s, 0.2 * s), (0.2 * s, -0.2 * s), GRID);

    // Correlation track and bar, right of centre
    let (bar_a, bar_b) = (0.44 * s, 0.46 * s);
    let track_t = |y: f64| ((y + reach) / (2.0 * reach)).clamp(0.0, 1.0);
    canvas.fill(bar_a, -reach, bar_b, reach, |y| gradient(&CORR_DIM, track_t(y)));
    canvas.outline(bar_a, -reach, bar_b, reach, GRID);
    if let Some(corr) = correlation {
        let tip = -reach * corr.clamp(-1.0, 1.0) as f64;
        canvas.fill(bar_a, 0.0, bar_b, tip, |y| gradient(&CORR_BRIGHT, track_t(y)));
    }

    // Pan track and bar, below centre
    canvas.fill(-reach, bar_a, reach, bar_b, |_| BACKGROUND);
    canvas.outline(-reach, bar_a, reach, bar_b, GRID);
    if let Some(pan) = pan {
        let tip = reach * pan.clamp(-1.0, 1.0) as f64;
        canvas.fill(0.0, bar_a, tip, bar_b, |_| PAN_FILL);
        canvas.line((tip, bar_a), (tip, bar_b), PAN_EDGE);
    }

    canvas.blend_layer(layer);
    canvas.img
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_layer(size: usize) -> Vec<u8> {
        let mut layer = vec![255u8; size * size * 4];
        for p in layer.chunks_exact_mut(4) {
            p[3] = 0;
        }
        layer
    }

    #[test]
    fn test_background_and_graticule() {
        let img = render_overlay(&empty_layer(320), 320, None, None);
        assert_eq!(img.dimensions(), (320, 320));
        // Corner is background
        assert_eq!(img.get_pixel(0, 0).0, [16, 16, 16, 255]);
        // Centre lies on the axes
        assert_eq!(img.get_pixel(160, 160).0, [64, 64, 64, 255]);
    }

    #[test]
    fn test_phosphor_is_blended_on_top() {
        let mut layer = empty_layer(320);
        let i = (100 * 320 + 100) * 4;
        layer[i + 3] = 255;
        let img = render_overlay(&layer, 320, None, None);
        assert_eq!(img.get_pixel(100, 100).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_positive_correlation_bar_is_green_above_centre() {
        let img = render_overlay(&empty_layer(320), 320, Some(1.0), None);
        // x = 160 + 0.45 * 320, y = 160 - 0.2 * 320
        assert_eq!(img.get_pixel(304, 96).0, [0, 192, 0, 255]);
        // Below centre stays the dim track
        let below = img.get_pixel(304, 250).0;
        assert!(below[0] <= 48 && below[1] <= 48);
    }

    #[test]
    fn test_negative_correlation_bar_turns_red() {
        let img = render_overlay(&empty_layer(320), 320, Some(-1.0), None);
        let near_bottom = img.get_pixel(304, 285).0;
        assert!(near_bottom[0] > 150 && near_bottom[1] < 60, "{:?}", near_bottom);
    }

    #[test]
    fn test_pan_bar_extends_left_for_negative_pan() {
        let img = render_overlay(&empty_layer(320), 320, None, Some(-0.5));
        // y = 160 + 0.45 * 320
        assert_eq!(img.get_pixel(120, 304).0, [128, 128, 128, 255]);
        assert_eq!(img.get_pixel(200, 304).0, [16, 16, 16, 255]);
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(gradient(&CORR_BRIGHT, 0.1), [0, 192, 0]);
        assert_eq!(gradient(&CORR_BRIGHT, 0.75), [192, 192, 0]);
        assert_eq!(gradient(&CORR_BRIGHT, 1.0), [192, 0, 0]);
    }
}
