//! Core types shared across the Latsynth pipeline.
//!
//! This module defines the per-call configuration (defects, noise,
//! projection), the 2D [`Projection`] produced by the pipeline, and the
//! [`SampleLabel`] that names output files and manifest entries.

use serde::{Deserialize, Serialize};

use latsynth_geometry::shapes::{ShapeKind, ShapeSpec};
use latsynth_geometry::transform::EulerAngles;

use crate::PipelineError;

/// How defect points are chosen for removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectPolicy {
    /// Pick `k` distinct indices of `N` in one draw.
    #[default]
    Subset,
    /// Draw a uniform index in the shrinking set `k` times, removing each.
    /// Reproduces the historical draw sequence.
    ShrinkingIndex,
}

/// Fraction of points to remove at random.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefectConfig {
    /// Fraction in `[0, 1)`.
    pub fraction: f64,
    #[serde(default)]
    pub policy: DefectPolicy,
}

impl DefectConfig {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction,
            policy: DefectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DefectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.fraction.is_finite() || !(0.0..1.0).contains(&self.fraction) {
            return Err(PipelineError::InvalidParameter(format!(
                "Defect fraction must lie in [0, 1), got {}",
                self.fraction
            )));
        }
        Ok(())
    }
}

/// When positional jitter is applied relative to the rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseStage {
    #[default]
    PreRotation,
    PostRotation,
}

/// Gaussian positional noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Standard deviation in units of the lattice spacing.
    pub pos_error: f64,
    #[serde(default)]
    pub stage: NoiseStage,
}

impl NoiseConfig {
    pub fn new(pos_error: f64) -> Self {
        Self {
            pos_error,
            stage: NoiseStage::default(),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.pos_error.is_finite() || self.pos_error < 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "Positional error must be non-negative, got {}",
                self.pos_error
            )));
        }
        Ok(())
    }
}

/// The coordinate axis discarded by the projector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAxis {
    X,
    Y,
    #[default]
    Z,
}

impl ViewAxis {
    /// Indices of the two coordinates kept after projection.
    pub fn kept_axes(&self) -> [usize; 2] {
        match self {
            ViewAxis::X => [1, 2],
            ViewAxis::Y => [0, 2],
            ViewAxis::Z => [0, 1],
        }
    }
}

/// Projection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub view_axis: ViewAxis,
    /// Half-width of the uniform stage-drift offset on each axis.
    #[serde(default = "default_drift")]
    pub drift: f64,
    /// Grid size for deduplicating projected points. `None` keeps every point.
    #[serde(default)]
    pub dedup_quantum: Option<f64>,
}

fn default_drift() -> f64 {
    2.0
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            view_axis: ViewAxis::Z,
            drift: default_drift(),
            dedup_quantum: None,
        }
    }
}

impl ProjectionConfig {
    /// Settings with no drift and no deduplication.
    pub fn still(view_axis: ViewAxis) -> Self {
        Self {
            view_axis,
            drift: 0.0,
            dedup_quantum: None,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.drift.is_finite() || self.drift < 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "Stage drift must be non-negative, got {}",
                self.drift
            )));
        }
        if let Some(q) = self.dedup_quantum {
            if !q.is_finite() || q <= 0.0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "Deduplication quantum must be positive, got {}",
                    q
                )));
            }
        }
        Ok(())
    }
}

/// A 2D point set produced by the projector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    points: Vec<[f64; 2]>,
}

impl Projection {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 2]> {
        self.points.iter()
    }

    pub fn into_points(self) -> Vec<[f64; 2]> {
        self.points
    }
}

/// Everything one generation call needs, apart from the vertex library and
/// the random source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub shape: ShapeSpec,
    pub angles: EulerAngles,
    pub defects: DefectConfig,
    pub noise: NoiseConfig,
    pub projection: ProjectionConfig,
}

impl GenerationParams {
    /// Parameters for an unrotated, defect-free, noise-free shape with
    /// default projection settings.
    pub fn new(shape: ShapeSpec) -> Self {
        Self {
            shape,
            angles: EulerAngles::default(),
            defects: DefectConfig::default(),
            noise: NoiseConfig::default(),
            projection: ProjectionConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.defects.validate()?;
        self.noise.validate()?;
        self.projection.validate()?;
        for (name, angle) in [("rx", self.angles.rx), ("ry", self.angles.ry), ("rz", self.angles.rz)] {
            if !angle.is_finite() {
                return Err(PipelineError::InvalidParameter(format!(
                    "Rotation angle {} must be finite, got {}",
                    name, angle
                )));
            }
        }
        Ok(())
    }
}

/// Label attached to one generated sample.
///
/// The label derives the deterministic file stem
/// `"{Kind} W{w} RX{rx} RY{ry}[ RZ{rz}] D{pct} {iter}"`; RZ is only present
/// when non-zero so cube-only sweeps keep their historical names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleLabel {
    pub kind: ShapeKind,
    pub width: usize,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    /// Defect fraction as a whole percentage.
    pub defect_percent: u32,
    pub iteration: usize,
}

impl SampleLabel {
    pub fn from_params(params: &GenerationParams, iteration: usize) -> Self {
        Self {
            kind: params.shape.kind(),
            width: params.shape.width(),
            rx: params.angles.rx,
            ry: params.angles.ry,
            rz: params.angles.rz,
            defect_percent: (params.defects.fraction * 100.0).round() as u32,
            iteration,
        }
    }

    /// File stem without extension.
    pub fn file_stem(&self) -> String {
        let mut stem = format!("{} W{} RX{} RY{}", self.kind.label(), self.width, self.rx, self.ry);
        if self.rz != 0.0 {
            stem.push_str(&format!(" RZ{}", self.rz));
        }
        stem.push_str(&format!(" D{} {}", self.defect_percent, self.iteration));
        stem
    }

    /// File name of the sharp image.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem(), extension)
    }

    /// File name of the blurred variant for a given kernel size.
    pub fn blurred_file_name(&self, kernel: u32, extension: &str) -> String {
        format!("{} B{}.{}", self.file_stem(), kernel, extension)
    }

    /// Sub-folder (relative to the dataset directory) for blurred variants.
    pub fn blurred_subdir(&self) -> std::path::PathBuf {
        std::path::Path::new("Train").join(format!("RX{}", self.rx))
    }
}
