//! Stochastic defects and positional noise.
//!
//! Two independent perturbations model an imperfect physical structure:
//!
//! - **Defects** remove $k = \lfloor d N \rfloor$ points, simulating missing
//!   atoms. Survivors keep their relative order.
//! - **Positional noise** adds i.i.d. $\mathcal{N}(0, \sigma^2)$ jitter to
//!   every coordinate with $\sigma = \text{pos\_error} \cdot a$.
//!
//! Both are no-ops that draw nothing from the random source when their
//! magnitude is zero.

use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use latsynth_geometry::lattice::PointSet;

use crate::types::{DefectConfig, DefectPolicy, NoiseConfig};
use crate::PipelineError;

/// Number of points removed from a set of `n` at the given fraction.
pub fn defect_count(fraction: f64, n: usize) -> usize {
    ((fraction * n as f64).floor() as usize).min(n)
}

/// Remove a fraction of points at random.
pub fn remove_defects<R: Rng + ?Sized>(
    points: PointSet,
    config: &DefectConfig,
    rng: &mut R,
) -> Result<PointSet, PipelineError> {
    config.validate()?;
    if config.fraction == 0.0 {
        return Ok(points);
    }

    let n = points.len();
    let k = defect_count(config.fraction, n);
    let mut survivors = points.into_points();

    match config.policy {
        DefectPolicy::ShrinkingIndex => {
            for _ in 0..k {
                let idx = rng.gen_range(0..survivors.len());
                survivors.remove(idx);
            }
        }
        DefectPolicy::Subset => {
            let mut removed = vec![false; n];
            for idx in index::sample(rng, n, k) {
                removed[idx] = true;
            }
            let mut flags = removed.into_iter();
            survivors.retain(|_| !flags.next().unwrap_or(false));
        }
    }

    log::trace!("Removed {} of {} points ({:?})", k, n, config.policy);
    Ok(PointSet::new(survivors))
}

/// Add Gaussian jitter with standard deviation `pos_error * lattice_spacing`
/// to every coordinate.
pub fn jitter_positions<R: Rng + ?Sized>(
    points: PointSet,
    config: &NoiseConfig,
    lattice_spacing: f64,
    rng: &mut R,
) -> Result<PointSet, PipelineError> {
    config.validate()?;
    if config.pos_error == 0.0 {
        return Ok(points);
    }

    let sigma = config.pos_error * lattice_spacing;
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| PipelineError::InvalidParameter(format!("Noise distribution: {}", e)))?;

    let mut jittered = points.into_points();
    for p in jittered.iter_mut() {
        for c in p.iter_mut() {
            *c += normal.sample(rng);
        }
    }
    Ok(PointSet::new(jittered))
}
