//! Projection of 3D point sets onto the image plane.
//!
//! The projector drops the view axis, keeping every point: coincident
//! projected points are meaningful because they accumulate intensity when
//! rendered. Stage drift then shifts the whole projection by one random
//! offset. Deduplication is available for analysis but is not part of the
//! dataset pipeline.

use std::collections::HashSet;

use rand::Rng;

use latsynth_geometry::lattice::PointSet;

use crate::types::{Projection, ViewAxis};

/// Drop `axis` from every point.
pub fn project(points: &PointSet, axis: ViewAxis) -> Projection {
    let [i, j] = axis.kept_axes();
    Projection::new(points.iter().map(|p| [p[i], p[j]]).collect())
}

/// Shift every point by one offset drawn from `U(-drift, drift)` per axis.
///
/// Returns the shifted projection and the offset applied.
pub fn apply_drift<R: Rng + ?Sized>(projection: Projection, drift: f64, rng: &mut R) -> (Projection, [f64; 2]) {
    if drift == 0.0 {
        return (projection, [0.0, 0.0]);
    }
    let offset = [rng.gen_range(-drift..drift), rng.gen_range(-drift..drift)];
    let shifted = projection
        .into_points()
        .into_iter()
        .map(|p| [p[0] + offset[0], p[1] + offset[1]])
        .collect();
    (Projection::new(shifted), offset)
}

/// Quantise points to a grid of pitch `quantum` and keep the first point of
/// each occupied cell.
pub fn deduplicate(projection: &Projection, quantum: f64) -> Projection {
    let mut seen = HashSet::with_capacity(projection.len());
    let kept = projection
        .iter()
        .filter(|p| {
            let key = ((p[0] / quantum).round() as i64, (p[1] / quantum).round() as i64);
            seen.insert(key)
        })
        .copied()
        .collect();
    Projection::new(kept)
}

/// Number of points in `projection` that coincide (within `quantum`) with each
/// distinct position, in order of first appearance.
pub fn multiplicities(projection: &Projection, quantum: f64) -> Vec<([f64; 2], usize)> {
    let mut order: Vec<(i64, i64)> = Vec::new();
    let mut counts: std::collections::HashMap<(i64, i64), ([f64; 2], usize)> = Default::default();
    for p in projection.iter() {
        let key = ((p[0] / quantum).round() as i64, (p[1] / quantum).round() as i64);
        counts
            .entry(key)
            .and_modify(|e| e.1 += 1)
            .or_insert_with(|| {
                order.push(key);
                (*p, 1)
            });
    }
    order.into_iter().map(|k| counts[&k]).collect()
}
