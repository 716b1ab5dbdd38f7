//! # Latsynth Geometry
//!
//! The 3D side of the generator: which shapes exist, where their points sit
//! before anything random happens, and how they are turned in space.
//!
//! ## Modules
//!
//! - [`shapes`]: shape families and validated width/spacing parameters.
//! - [`lattice`]: canonical point sets, centred on the origin.
//! - [`vertex_table`]: reader for the tetrahedron and octahedron vertex files.
//! - [`transform`]: Euler-angle rotations over whole point sets.

pub mod lattice;
pub mod shapes;
pub mod transform;
pub mod vertex_table;

use thiserror::Error;

use crate::shapes::ShapeKind;
use crate::vertex_table::ParseError;

/// Errors raised while building or loading lattice geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("No vertex table for {kind} of width {width} (available widths: {available:?})")]
    InvalidWidth {
        kind: ShapeKind,
        width: usize,
        available: Vec<usize>,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
