//! Render settings.
//!
//! Defaults reproduce the reference dataset style: a 3-inch canvas at
//! 100 dpi, ten blur layers, 7000 speckle points, a 15% crop, and a
//! 128×128 blurred variant when a secondary blur is requested.

use serde::{Deserialize, Serialize};

use crate::RenderError;

/// Synthetic blur layer parameters.
///
/// Layer `b` draws markers of area `start_size + size_growth · b²` (pt²) with
/// opacity `alpha_scale / (b² + 16b + 1) / width`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurLayers {
    pub count: usize,
    pub start_size: f64,
    pub size_growth: f64,
    pub alpha_scale: f64,
}

impl Default for BlurLayers {
    fn default() -> Self {
        Self {
            count: 10,
            start_size: 3.0,
            size_growth: 9.0,
            alpha_scale: 1.5,
        }
    }
}

impl BlurLayers {
    /// Marker area (pt²) of layer `b`.
    pub fn marker_area(&self, b: usize) -> f64 {
        let b = b as f64;
        self.start_size + self.size_growth * b * b
    }

    /// Marker opacity of layer `b` for a shape of the given width.
    pub fn alpha(&self, b: usize, shape_width: usize) -> f64 {
        let b = b as f64;
        let alpha = self.alpha_scale / (b * b + 16.0 * b + 1.0) / shape_width.max(1) as f64;
        alpha.clamp(0.0, 1.0)
    }
}

/// Background sensor-noise speckle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeckleConfig {
    /// Number of speckle markers.
    pub count: usize,
    /// Marker area (pt²).
    pub marker_area: f64,
    /// Mean of the Poisson draw controlling each marker's opacity.
    pub poisson_mean: f64,
}

impl Default for SpeckleConfig {
    fn default() -> Self {
        Self {
            count: 7000,
            marker_area: 2.0,
            poisson_mean: 50.0,
        }
    }
}

impl SpeckleConfig {
    /// Opacity of a speckle marker given its Poisson draw `k`.
    pub fn alpha(k: f64) -> f64 {
        ((1.0 - k / 100.0) / 15.0).clamp(0.0, 1.0)
    }
}

/// Convolution used for the blurred variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurKind {
    Gaussian,
    Box,
}

/// Secondary convolution blur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryBlur {
    pub kind: BlurKind,
    /// Window edge length in pixels. For Gaussian blur it also sets sigma
    /// and must be odd.
    pub kernel: u32,
}

impl SecondaryBlur {
    pub fn gaussian(kernel: u32) -> Self {
        Self {
            kind: BlurKind::Gaussian,
            kernel,
        }
    }

    pub fn boxed(kernel: u32) -> Self {
        Self {
            kind: BlurKind::Box,
            kernel,
        }
    }
}

/// Full render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas edge length in pixels.
    pub canvas_px: u32,
    /// Pixels per inch; converts marker sizes in points to pixels.
    pub dpi: f64,
    /// Extra axis range beyond half the shape width, in lattice units.
    pub margin: f64,
    pub layers: BlurLayers,
    pub speckle: Option<SpeckleConfig>,
    /// Fraction cropped from each side after rasterising.
    pub crop_fraction: f64,
    pub secondary_blur: Option<SecondaryBlur>,
    /// Edge length of the blurred variant. Only used when a variant is made.
    pub output_size: Option<u32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_px: 300,
            dpi: 100.0,
            margin: 4.0,
            layers: BlurLayers::default(),
            speckle: Some(SpeckleConfig::default()),
            crop_fraction: 0.15,
            secondary_blur: None,
            output_size: Some(128),
        }
    }
}

impl RenderConfig {
    /// Whether a blurred/resized variant is produced.
    pub fn has_variant(&self) -> bool {
        self.secondary_blur.is_some()
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: String| -> Result<(), RenderError> { Err(RenderError::InvalidParameter(msg)) };

        if self.canvas_px == 0 {
            return invalid("canvas_px must be positive".into());
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return invalid(format!("dpi must be positive, got {}", self.dpi));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return invalid(format!("margin must be non-negative, got {}", self.margin));
        }
        if !(0.0..0.5).contains(&self.crop_fraction) {
            return invalid(format!("crop_fraction must lie in [0, 0.5), got {}", self.crop_fraction));
        }
        if let Some(blur) = self.secondary_blur {
            if blur.kernel == 0 {
                return invalid("blur kernel must be positive".into());
            }
            if blur.kind == BlurKind::Gaussian && blur.kernel % 2 == 0 {
                return invalid(format!("Gaussian kernel must be odd, got {}", blur.kernel));
            }
        }
        if self.output_size == Some(0) {
            return invalid("output_size must be positive".into());
        }
        if let Some(speckle) = self.speckle {
            if !speckle.poisson_mean.is_finite() || speckle.poisson_mean <= 0.0 {
                return invalid(format!("speckle poisson_mean must be positive, got {}", speckle.poisson_mean));
            }
        }
        Ok(())
    }
}
