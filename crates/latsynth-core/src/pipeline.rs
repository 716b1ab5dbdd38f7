//! One-call generation pipeline.
//!
//! [`generate`] runs every geometric stage for a single sample:
//!
//! 1. canonical lattice for the shape,
//! 2. positional noise (before rotation unless configured otherwise),
//! 3. rotation $R_z R_y R_x$,
//! 4. defect removal,
//! 5. projection along the view axis,
//! 6. stage drift (and optional deduplication).
//!
//! The random source is drawn from in exactly this order, so two calls with
//! identically seeded generators produce identical output.

use rand::Rng;

use latsynth_geometry::lattice::{generate_lattice, PointSet};
use latsynth_geometry::transform::Transform;
use latsynth_geometry::vertex_table::VertexLibrary;

use crate::defects::{jitter_positions, remove_defects};
use crate::projection::{apply_drift, deduplicate, project};
use crate::types::{GenerationParams, NoiseStage, Projection};
use crate::PipelineError;

/// Intermediate and final products of a generation call.
#[derive(Debug, Clone)]
pub struct Generated {
    /// 3D points after noise, rotation and defects.
    pub points: PointSet,
    /// Final 2D projection, drift applied.
    pub projection: Projection,
    /// Stage-drift offset that was applied.
    pub drift_offset: [f64; 2],
    /// Number of points removed as defects.
    pub removed: usize,
}

/// Run the full geometric pipeline for one sample.
pub fn generate<R: Rng + ?Sized>(
    params: &GenerationParams,
    library: &VertexLibrary,
    rng: &mut R,
) -> Result<Generated, PipelineError> {
    params.validate()?;

    let spacing = params.shape.lattice_spacing();
    let mut points = generate_lattice(&params.shape, library)?;
    let canonical = points.len();

    if params.noise.stage == NoiseStage::PreRotation {
        points = jitter_positions(points, &params.noise, spacing, rng)?;
    }

    points = Transform::from_angles(&params.angles).apply_points(&points);

    if params.noise.stage == NoiseStage::PostRotation {
        points = jitter_positions(points, &params.noise, spacing, rng)?;
    }

    points = remove_defects(points, &params.defects, rng)?;
    let removed = canonical - points.len();

    let projected = project(&points, params.projection.view_axis);
    let (mut projection, drift_offset) = apply_drift(projected, params.projection.drift, rng);
    if let Some(quantum) = params.projection.dedup_quantum {
        projection = deduplicate(&projection, quantum);
    }

    log::debug!(
        "Generated {} W{}: {} points ({} removed), drift ({:.3}, {:.3})",
        params.shape.kind(),
        params.shape.width(),
        projection.len(),
        removed,
        drift_offset[0],
        drift_offset[1]
    );

    Ok(Generated {
        points,
        projection,
        drift_offset,
        removed,
    })
}

/// Convenience wrapper returning only the projection.
pub fn generate_projection<R: Rng + ?Sized>(
    params: &GenerationParams,
    library: &VertexLibrary,
    rng: &mut R,
) -> Result<Projection, PipelineError> {
    generate(params, library, rng).map(|g| g.projection)
}
