//! Canonical lattice point sets.
//!
//! Given a [`ShapeSpec`], this module produces the unrotated, defect-free
//! point set centred on the origin. Cubes are generated as a full
//! `width³` grid of pitch $a$; tetrahedra and octahedra come from the
//! [`VertexLibrary`] and are scaled by $a$.

use serde::{Deserialize, Serialize};

use crate::shapes::{ShapeKind, ShapeSpec};
use crate::vertex_table::VertexLibrary;
use crate::GeometryError;

/// An ordered set of 3D points.
///
/// Pipeline stages consume a `PointSet` and return a new one. Order is kept
/// stable so that seeded runs are reproducible point for point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    points: Vec<[f64; 3]>,
}

impl PointSet {
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 3]> {
        self.points.iter()
    }

    pub fn into_points(self) -> Vec<[f64; 3]> {
        self.points
    }

    /// Apply `f` to every point, producing a new set.
    pub fn map(&self, f: impl FnMut(&[f64; 3]) -> [f64; 3]) -> PointSet {
        PointSet::new(self.points.iter().map(f).collect())
    }
}

impl From<Vec<[f64; 3]>> for PointSet {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points)
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a [f64; 3];
    type IntoIter = std::slice::Iter<'a, [f64; 3]>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Generate the canonical point set for a shape.
///
/// Cubes ignore `library`. Tetrahedra and octahedra fail with
/// [`GeometryError::InvalidWidth`] when the library holds no table for the
/// requested width.
pub fn generate_lattice(spec: &ShapeSpec, library: &VertexLibrary) -> Result<PointSet, GeometryError> {
    match spec.kind() {
        ShapeKind::Cube => Ok(cube_lattice(spec.width(), spec.lattice_spacing())),
        kind @ (ShapeKind::Tetrahedron | ShapeKind::Octahedron) => {
            let vertices = library.get(kind, spec.width()).ok_or_else(|| GeometryError::InvalidWidth {
                kind,
                width: spec.width(),
                available: library.available_widths(kind),
            })?;
            let a = spec.lattice_spacing();
            Ok(PointSet::new(
                vertices.iter().map(|v| [v[0] * a, v[1] * a, v[2] * a]).collect(),
            ))
        }
    }
}

/// Full cubic grid of `width³` points with pitch `spacing`, centred on the origin.
///
/// Points are ordered with x varying slowest and z fastest.
pub fn cube_lattice(width: usize, spacing: f64) -> PointSet {
    let offset = (width as f64 - 1.0) / 2.0;
    let axis: Vec<f64> = (0..width).map(|i| spacing * (i as f64 - offset)).collect();

    let mut points = Vec::with_capacity(width * width * width);
    for &x in &axis {
        for &y in &axis {
            for &z in &axis {
                points.push([x, y, z]);
            }
        }
    }
    PointSet::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_point_count() {
        for w in 1..=6 {
            let spec = ShapeSpec::cube(w, 1.0).unwrap();
            let points = generate_lattice(&spec, &VertexLibrary::new()).unwrap();
            assert_eq!(points.len(), w * w * w);
        }
    }

    #[test]
    fn test_cube_width_one_is_origin() {
        let points = cube_lattice(1, 0.75);
        assert_eq!(points.points(), &[[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_cube_coordinates_on_grid() {
        let w = 5;
        let a = 0.75;
        let half = (w as f64 - 1.0) / 2.0 * a;
        let points = cube_lattice(w, a);

        for p in &points {
            for &c in p {
                assert!(c >= -half - 1e-12 && c <= half + 1e-12, "coordinate {} out of range", c);
                let steps = (c + half) / a;
                assert!((steps - steps.round()).abs() < 1e-9, "coordinate {} off grid", c);
            }
        }
    }

    #[test]
    fn test_cube_centred_on_origin() {
        let points = cube_lattice(4, 1.0);
        let n = points.len() as f64;
        for axis in 0..3 {
            let mean: f64 = points.iter().map(|p| p[axis]).sum::<f64>() / n;
            assert!(mean.abs() < 1e-12);
        }
    }

    #[test]
    fn test_tetrahedron_scaled_by_spacing() {
        let mut lib = VertexLibrary::new();
        lib.insert(ShapeKind::Tetrahedron, 2, vec![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        let spec = ShapeSpec::new(ShapeKind::Tetrahedron, 2, 0.5).unwrap();
        let points = generate_lattice(&spec, &lib).unwrap();
        assert_eq!(points.points(), &[[0.5, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_missing_table_lists_available_widths() {
        let mut lib = VertexLibrary::new();
        lib.insert(ShapeKind::Octahedron, 3, vec![[0.0; 3]]);
        let spec = ShapeSpec::new(ShapeKind::Octahedron, 4, 1.0).unwrap();
        match generate_lattice(&spec, &lib) {
            Err(GeometryError::InvalidWidth { kind, width, available }) => {
                assert_eq!(kind, ShapeKind::Octahedron);
                assert_eq!(width, 4);
                assert_eq!(available, vec![3]);
            }
            other => panic!("expected InvalidWidth, got {:?}", other),
        }
    }
}
