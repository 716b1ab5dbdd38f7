//! # Latsynth Core
//!
//! The generation pipeline behind the Latsynth dataset generator. It turns a
//! shape specification and a set of run parameters into a noisy 2D point
//! projection ready for rendering:
//!
//! ```text
//! lattice → positional noise → rotation → defects → projection → stage drift
//! ```
//!
//! All randomness is drawn from a caller-supplied [`rand::Rng`], so a seeded
//! generator reproduces a run exactly.
//!
//! ## Modules
//!
//! - [`types`]: Configuration, projection, and label types.
//! - [`defects`]: Point removal and Gaussian positional jitter.
//! - [`projection`]: Axis drop, stage drift, and optional deduplication.
//! - [`pipeline`]: One-call composition of the stages.

pub mod defects;
pub mod pipeline;
pub mod projection;
pub mod types;

pub use latsynth_geometry as geometry;

use latsynth_geometry::GeometryError;
use thiserror::Error;

/// Errors raised by a generation call.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
