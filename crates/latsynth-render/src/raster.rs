//! Operations on rendered RGB rasters: border crop, convolution blur, and
//! resizing.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array2;

use crate::config::{BlurKind, SecondaryBlur};

/// Remove `fraction` of the width and height from each side.
///
/// The retained window starts at `floor(n · fraction)` and ends at
/// `n − floor(n · fraction)`.
pub fn crop_border(img: &RgbImage, fraction: f64) -> RgbImage {
    let (w, h) = img.dimensions();
    let low_x = (w as f64 * fraction) as u32;
    let low_y = (h as f64 * fraction) as u32;
    let new_w = w.saturating_sub(2 * low_x).max(1);
    let new_h = h.saturating_sub(2 * low_y).max(1);
    imageops::crop_imm(img, low_x, low_y, new_w, new_h).to_image()
}

/// Standard deviation of a Gaussian kernel of edge `kernel`, using the
/// common convention for a kernel specified by size alone.
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Apply the configured convolution blur.
pub fn apply_blur(img: &RgbImage, blur: &SecondaryBlur) -> RgbImage {
    match blur.kind {
        BlurKind::Gaussian => gaussian_blur(img, blur.kernel),
        BlurKind::Box => box_blur(img, blur.kernel),
    }
}

/// Normalised `kernel × kernel` mean filter with mirrored borders
/// (the edge pixel itself is not repeated).
pub fn box_blur(img: &RgbImage, kernel: u32) -> RgbImage {
    let k = kernel.max(1) as usize;
    separable_filter(img, &vec![1.0 / k as f32; k])
}

/// Gaussian filter truncated to a `kernel × kernel` window, with sigma from
/// [`gaussian_sigma`] and mirrored borders.
pub fn gaussian_blur(img: &RgbImage, kernel: u32) -> RgbImage {
    separable_filter(img, &gaussian_weights(kernel))
}

/// Normalised 1D Gaussian taps for a window of `kernel` samples.
pub fn gaussian_weights(kernel: u32) -> Vec<f32> {
    let k = kernel.max(1) as usize;
    let sigma = gaussian_sigma(kernel) as f64;
    let centre = (k as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..k)
        .map(|i| {
            let x = i as f64 - centre;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| (w / total) as f32).collect()
}

/// Convolve every channel with `weights` along columns, then rows.
fn separable_filter(img: &RgbImage, weights: &[f32]) -> RgbImage {
    let (w, h) = img.dimensions();
    if weights.len() <= 1 {
        return img.clone();
    }

    let mut channels = Vec::with_capacity(3);
    for c in 0..3 {
        let plane = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
            img.get_pixel(col as u32, row as u32)[c] as f32
        });
        let horizontal = convolve_along(&plane, weights, Axis2::Cols);
        channels.push(convolve_along(&horizontal, weights, Axis2::Rows));
    }

    RgbImage::from_fn(w, h, |x, y| {
        let (row, col) = (y as usize, x as usize);
        let px = |c: usize| channels[c][[row, col]].round().clamp(0.0, 255.0) as u8;
        Rgb([px(0), px(1), px(2)])
    })
}

#[derive(Clone, Copy)]
enum Axis2 {
    Rows,
    Cols,
}

/// One-dimensional weighted sum along rows or columns. The window for
/// index `i` covers `i − k/2 ..= i − k/2 + k − 1`.
fn convolve_along(plane: &Array2<f32>, weights: &[f32], axis: Axis2) -> Array2<f32> {
    let (rows, cols) = plane.dim();
    let anchor = (weights.len() / 2) as isize;

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (i, n) = match axis {
            Axis2::Rows => (r as isize, rows as isize),
            Axis2::Cols => (c as isize, cols as isize),
        };
        let mut sum = 0.0;
        for (k, &weight) in weights.iter().enumerate() {
            let j = reflect_101(i - anchor + k as isize, n);
            sum += weight
                * match axis {
                    Axis2::Rows => plane[[j, c]],
                    Axis2::Cols => plane[[r, j]],
                };
        }
        sum
    })
}

/// Mirror an out-of-range index about the edges without repeating the
/// edge sample: `-1 → 1`, `n → n − 2`.
fn reflect_101(mut i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

/// Resize to a square of edge `size` with bilinear filtering.
pub fn resize_square(img: &RgbImage, size: u32) -> RgbImage {
    imageops::resize(img, size, size, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_dimensions() {
        let img = RgbImage::new(300, 300);
        assert_eq!(crop_border(&img, 0.15).dimensions(), (210, 210));
        assert_eq!(crop_border(&img, 0.0).dimensions(), (300, 300));

        let img = RgbImage::new(101, 50);
        // floor(15.15) = 15, floor(7.5) = 7
        assert_eq!(crop_border(&img, 0.15).dimensions(), (71, 36));
    }

    #[test]
    fn test_crop_keeps_centre() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(5, 5, Rgb([200, 0, 0]));
        let cropped = crop_border(&img, 0.2);
        assert_eq!(cropped.get_pixel(3, 3), &Rgb([200, 0, 0]));
    }

    #[test]
    fn test_gaussian_sigma() {
        assert!((gaussian_sigma(5) - 1.1).abs() < 1e-6);
        assert!((gaussian_sigma(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_box_blur_preserves_constant_image() {
        let img = RgbImage::from_pixel(12, 9, Rgb([40, 80, 120]));
        let out = box_blur(&img, 5);
        assert!(out.pixels().all(|p| *p == Rgb([40, 80, 120])));
    }

    #[test]
    fn test_box_blur_spreads_impulse() {
        let mut img = RgbImage::new(9, 9);
        img.put_pixel(4, 4, Rgb([255, 255, 255]));
        let out = box_blur(&img, 3);
        // 255 / 9 ≈ 28.3
        assert_eq!(out.get_pixel(4, 4)[0], 28);
        assert_eq!(out.get_pixel(3, 5)[0], 28);
        assert_eq!(out.get_pixel(2, 4)[0], 0);
    }

    #[test]
    fn test_gaussian_weights() {
        let w = gaussian_weights(5);
        assert_eq!(w.len(), 5);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((w[0] - w[4]).abs() < 1e-7 && (w[1] - w[3]).abs() < 1e-7);
        assert!(w[2] > w[1] && w[1] > w[0]);
    }

    #[test]
    fn test_gaussian_blur_stays_inside_kernel_window() {
        let mut img = RgbImage::new(15, 15);
        img.put_pixel(7, 7, Rgb([255, 255, 255]));
        let out = gaussian_blur(&img, 5);
        assert!(out.get_pixel(7, 7)[0] < 255);
        assert!(out.get_pixel(9, 9)[0] > 0);
        // Three pixels away is outside a 5-tap window.
        for (x, y) in [(10, 7), (7, 4), (10, 10), (4, 7)] {
            assert_eq!(out.get_pixel(x, y)[0], 0, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_gaussian_blur_preserves_constant_image() {
        let img = RgbImage::from_pixel(10, 8, Rgb([12, 130, 250]));
        let out = apply_blur(&img, &SecondaryBlur::gaussian(5));
        assert!(out.pixels().all(|p| *p == Rgb([12, 130, 250])));
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn test_resize() {
        let img = RgbImage::new(210, 210);
        assert_eq!(resize_square(&img, 128).dimensions(), (128, 128));
    }
}
