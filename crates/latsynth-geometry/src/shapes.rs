//! Lattice shape specifications.
//!
//! A [`ShapeSpec`] fully determines the canonical point set of a structure:
//! the shape family, its discretisation width (points along an edge), and
//! the lattice spacing that converts integer grid steps into coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// The closed set of shape families the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Cube,
    Tetrahedron,
    Octahedron,
}

impl ShapeKind {
    /// All shape kinds, in display order.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Cube, ShapeKind::Tetrahedron, ShapeKind::Octahedron];

    /// Capitalised name used in output file names (`Cube W4 ...`).
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Cube => "Cube",
            ShapeKind::Tetrahedron => "Tetrahedron",
            ShapeKind::Octahedron => "Octahedron",
        }
    }

    /// File-name prefix of the vertex tables for this kind (`Tetra4_Verts.txt`).
    ///
    /// Cubes are generated analytically and have no table.
    pub fn table_prefix(&self) -> Option<&'static str> {
        match self {
            ShapeKind::Cube => None,
            ShapeKind::Tetrahedron => Some("Tetra"),
            ShapeKind::Octahedron => Some("Octa"),
        }
    }

    /// Whether the point set comes from a vertex table rather than a formula.
    pub fn requires_table(&self) -> bool {
        self.table_prefix().is_some()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Tetrahedron => "tetrahedron",
            ShapeKind::Octahedron => "octahedron",
        };
        f.write_str(name)
    }
}

impl FromStr for ShapeKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" => Ok(ShapeKind::Cube),
            "tetrahedron" | "tetra" => Ok(ShapeKind::Tetrahedron),
            "octahedron" | "octa" => Ok(ShapeKind::Octahedron),
            other => Err(GeometryError::InvalidParameter(format!(
                "Unknown shape kind '{}'. Valid kinds: cube, tetrahedron, octahedron",
                other
            ))),
        }
    }
}

/// Validated shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeSpec {
    kind: ShapeKind,
    width: usize,
    lattice_spacing: f64,
}

impl ShapeSpec {
    /// Create a shape specification.
    ///
    /// Fails with [`GeometryError::InvalidParameter`] when `width` is zero or
    /// `lattice_spacing` is not a positive finite number.
    pub fn new(kind: ShapeKind, width: usize, lattice_spacing: f64) -> Result<Self, GeometryError> {
        if width < 1 {
            return Err(GeometryError::InvalidParameter(format!(
                "{} width must be at least 1, got {}",
                kind, width
            )));
        }
        if !lattice_spacing.is_finite() || lattice_spacing <= 0.0 {
            return Err(GeometryError::InvalidParameter(format!(
                "Lattice spacing must be positive, got {}",
                lattice_spacing
            )));
        }
        Ok(Self {
            kind,
            width,
            lattice_spacing,
        })
    }

    /// Shorthand for a cube.
    pub fn cube(width: usize, lattice_spacing: f64) -> Result<Self, GeometryError> {
        Self::new(ShapeKind::Cube, width, lattice_spacing)
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn lattice_spacing(&self) -> f64 {
        self.lattice_spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!("Cube".parse::<ShapeKind>().unwrap(), ShapeKind::Cube);
        assert_eq!("tetra".parse::<ShapeKind>().unwrap(), ShapeKind::Tetrahedron);
        assert_eq!(" OCTAHEDRON ".parse::<ShapeKind>().unwrap(), ShapeKind::Octahedron);
        assert!("sphere".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_spec_rejects_bad_parameters() {
        assert!(matches!(
            ShapeSpec::cube(0, 1.0),
            Err(GeometryError::InvalidParameter(_))
        ));
        assert!(matches!(
            ShapeSpec::cube(3, -0.5),
            Err(GeometryError::InvalidParameter(_))
        ));
        assert!(matches!(
            ShapeSpec::cube(3, f64::NAN),
            Err(GeometryError::InvalidParameter(_))
        ));
        assert!(ShapeSpec::cube(1, 0.75).is_ok());
    }

    #[test]
    fn test_table_prefixes() {
        assert_eq!(ShapeKind::Cube.table_prefix(), None);
        assert_eq!(ShapeKind::Tetrahedron.table_prefix(), Some("Tetra"));
        assert_eq!(ShapeKind::Octahedron.table_prefix(), Some("Octa"));
        assert!(!ShapeKind::Cube.requires_table());
    }
}
