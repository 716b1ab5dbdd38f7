//! The drawing surface.
//!
//! A [`Canvas`] is a square single-channel intensity buffer on a black
//! background. White disc markers are alpha-composited onto it in draw
//! order, the way a scatter plot stacks translucent markers. Marker sizes
//! are given as areas in points², converted to pixels with the canvas dpi.
//!
//! The canvas is only drawn on through a [`CanvasSession`], which clears it
//! on acquisition and again when dropped. A renderer owns exactly one
//! canvas; parallel workers each need their own renderer.

use std::ops::{Deref, DerefMut};

use image::{Rgb, RgbImage};
use ndarray::Array2;

const POINTS_PER_INCH: f64 = 72.0;

/// Square intensity buffer with data-space axis limits.
#[derive(Debug, Clone)]
pub struct Canvas {
    size_px: usize,
    dpi: f64,
    limits: [f64; 2],
    /// Row-major intensity in `[0, 1]`; row 0 is the top edge.
    intensity: Array2<f32>,
}

impl Canvas {
    pub fn new(size_px: u32, dpi: f64) -> Self {
        let size_px = size_px as usize;
        Self {
            size_px,
            dpi,
            limits: [-1.0, 1.0],
            intensity: Array2::zeros((size_px, size_px)),
        }
    }

    /// Reset every pixel to background.
    pub fn clear(&mut self) {
        self.intensity.fill(0.0);
    }

    /// Whether no pixel has been drawn on.
    pub fn is_blank(&self) -> bool {
        self.intensity.iter().all(|&v| v == 0.0)
    }

    /// Acquire the canvas for one render with the given axis limits
    /// (applied to both axes).
    pub fn session(&mut self, limits: [f64; 2]) -> CanvasSession<'_> {
        self.clear();
        self.limits = limits;
        CanvasSession { canvas: self }
    }

    /// Convert a marker area in pt² into a radius in pixels.
    pub fn marker_radius_px(&self, area_pt2: f64) -> f64 {
        area_pt2.max(0.0).sqrt() / 2.0 * self.dpi / POINTS_PER_INCH
    }

    /// Map a data-space point to fractional pixel coordinates `(col, row)`.
    pub fn to_pixel(&self, point: &[f64; 2]) -> (f64, f64) {
        let [lo, hi] = self.limits;
        let scale = self.size_px as f64 / (hi - lo);
        ((point[0] - lo) * scale, (hi - point[1]) * scale)
    }

    /// Draw every point as a disc with the same area and opacity.
    pub fn scatter(&mut self, points: &[[f64; 2]], area_pt2: f64, alpha: f64) {
        let radius = self.marker_radius_px(area_pt2);
        for p in points {
            self.draw_disc(p, radius, alpha);
        }
    }

    /// Draw each point with its own opacity.
    pub fn scatter_with_alpha(&mut self, points: &[[f64; 2]], alphas: &[f64], area_pt2: f64) {
        let radius = self.marker_radius_px(area_pt2);
        for (p, &alpha) in points.iter().zip(alphas) {
            self.draw_disc(p, radius, alpha);
        }
    }

    /// Composite a white disc over the canvas. Edge pixels get fractional
    /// coverage so that small markers do not alias.
    fn draw_disc(&mut self, centre: &[f64; 2], radius: f64, alpha: f64) {
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let (cx, cy) = self.to_pixel(centre);
        let n = self.size_px as f64;
        let reach = radius + 0.5;
        if cx + reach < 0.0 || cy + reach < 0.0 || cx - reach >= n || cy - reach >= n {
            return;
        }

        let col_lo = (cx - reach).floor().max(0.0) as usize;
        let col_hi = ((cx + reach).ceil().min(n - 1.0)) as usize;
        let row_lo = (cy - reach).floor().max(0.0) as usize;
        let row_hi = ((cy + reach).ceil().min(n - 1.0)) as usize;
        let alpha = alpha.min(1.0) as f32;

        for row in row_lo..=row_hi {
            let dy = row as f64 + 0.5 - cy;
            for col in col_lo..=col_hi {
                let dx = col as f64 + 0.5 - cx;
                let coverage = (reach - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0) as f32;
                if coverage == 0.0 {
                    continue;
                }
                let a = alpha * coverage;
                let v = &mut self.intensity[[row, col]];
                *v = *v * (1.0 - a) + a;
            }
        }
    }

    /// Intensity at a pixel.
    pub fn intensity(&self, row: usize, col: usize) -> f32 {
        self.intensity[[row, col]]
    }

    /// Rasterise to an 8-bit RGB image (grey levels on all channels).
    pub fn to_rgb_image(&self) -> RgbImage {
        let n = self.size_px as u32;
        RgbImage::from_fn(n, n, |x, y| {
            let v = self.intensity[[y as usize, x as usize]].clamp(0.0, 1.0);
            let g = (v * 255.0).round() as u8;
            Rgb([g, g, g])
        })
    }
}

/// Exclusive, scoped use of a [`Canvas`]. Clears the canvas when dropped.
pub struct CanvasSession<'a> {
    canvas: &'a mut Canvas,
}

impl Deref for CanvasSession<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl DerefMut for CanvasSession<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for CanvasSession<'_> {
    fn drop(&mut self) {
        self.canvas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_radius() {
        let canvas = Canvas::new(300, 72.0);
        // 4 pt² → 2 pt diameter → 1 px radius at 72 dpi.
        assert!((canvas.marker_radius_px(4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_mapping() {
        let mut canvas = Canvas::new(100, 100.0);
        let session = canvas.session([-5.0, 5.0]);
        let (col, row) = session.to_pixel(&[0.0, 0.0]);
        assert!((col - 50.0).abs() < 1e-12 && (row - 50.0).abs() < 1e-12);
        let (col, row) = session.to_pixel(&[-5.0, 5.0]);
        assert!(col.abs() < 1e-12 && row.abs() < 1e-12);
    }

    #[test]
    fn test_disc_composites_and_session_clears() {
        let mut canvas = Canvas::new(64, 72.0);
        {
            let mut session = canvas.session([-1.0, 1.0]);
            session.scatter(&[[0.0, 0.0]], 64.0, 0.5);
            assert!((session.intensity(32, 32) - 0.5).abs() < 1e-6);
            session.scatter(&[[0.0, 0.0]], 64.0, 0.5);
            assert!((session.intensity(32, 32) - 0.75).abs() < 1e-6);
            // Corners untouched.
            assert_eq!(session.intensity(0, 0), 0.0);
        }
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_offscreen_points_ignored() {
        let mut canvas = Canvas::new(32, 72.0);
        let mut session = canvas.session([-1.0, 1.0]);
        session.scatter(&[[50.0, 50.0], [-50.0, 0.0]], 16.0, 1.0);
        assert!(session.is_blank());
    }

    #[test]
    fn test_rgb_conversion() {
        let mut canvas = Canvas::new(16, 72.0);
        let mut session = canvas.session([-1.0, 1.0]);
        session.scatter(&[[0.0, 0.0]], 100.0, 1.0);
        let img = session.to_rgb_image();
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.get_pixel(8, 8), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}
