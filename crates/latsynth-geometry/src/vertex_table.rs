//! Parser and in-memory library for static vertex tables.
//!
//! Tetrahedron and octahedron point sets are not generated at runtime. They
//! come from a one-off mesh-subdivision step that writes one plain-text file
//! per shape and width, e.g. `Tetra4_Verts.txt`. Two layouts occur:
//!
//! ```text
//! # axis rows: one row per coordinate, one column per vertex
//! x0 x1 x2 x3 ...
//! y0 y1 y2 y3 ...
//! z0 z1 z2 z3 ...
//!
//! # vertex rows: one row per vertex
//! x0 y0 z0
//! x1 y1 z1
//! ...
//! ```
//!
//! Coordinates are in lattice units and get scaled by the lattice spacing
//! when a lattice is generated.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::shapes::ShapeKind;
use crate::GeometryError;

/// Errors while reading a vertex table.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read vertex table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Format { line: usize, message: String },
}

/// How the numbers in a vertex table are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Three rows (x, y, z), one column per vertex.
    AxisRows,
    /// One row of three values per vertex.
    VertexRows,
}

/// Parse a vertex table, detecting its layout.
///
/// Exactly three rows of equal length are read as [`TableLayout::AxisRows`];
/// this includes the ambiguous 3×3 case, which is what the exporter writes
/// for a three-vertex mesh. Anything else must be [`TableLayout::VertexRows`].
pub fn parse_vertex_table(content: &str) -> Result<Vec<[f64; 3]>, ParseError> {
    let rows = parse_rows(content)?;
    let layout = detect_layout(&rows)?;
    Ok(assemble(&rows, layout))
}

/// Parse a vertex table with a known layout.
pub fn parse_vertex_table_as(content: &str, layout: TableLayout) -> Result<Vec<[f64; 3]>, ParseError> {
    let rows = parse_rows(content)?;
    check_layout(&rows, layout)?;
    Ok(assemble(&rows, layout))
}

/// A parsed numeric row with its 1-based source line.
struct Row {
    line: usize,
    values: Vec<f64>,
}

fn parse_rows(content: &str) -> Result<Vec<Row>, ParseError> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| ParseError::Format {
                    line: idx + 1,
                    message: format!("Invalid coordinate: {}", token),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(Row {
            line: idx + 1,
            values,
        });
    }

    if rows.is_empty() {
        return Err(ParseError::Format {
            line: 1,
            message: "Vertex table contains no coordinates".into(),
        });
    }
    Ok(rows)
}

fn detect_layout(rows: &[Row]) -> Result<TableLayout, ParseError> {
    if rows.len() == 3 && rows.iter().all(|r| r.values.len() == rows[0].values.len()) {
        return Ok(TableLayout::AxisRows);
    }
    check_layout(rows, TableLayout::VertexRows)?;
    Ok(TableLayout::VertexRows)
}

fn check_layout(rows: &[Row], layout: TableLayout) -> Result<(), ParseError> {
    match layout {
        TableLayout::AxisRows => {
            if rows.len() != 3 {
                return Err(ParseError::Format {
                    line: rows[rows.len().min(3) - 1].line,
                    message: format!("Expected 3 axis rows, found {}", rows.len()),
                });
            }
            let n = rows[0].values.len();
            if let Some(bad) = rows.iter().find(|r| r.values.len() != n) {
                return Err(ParseError::Format {
                    line: bad.line,
                    message: format!("Axis row has {} values, expected {}", bad.values.len(), n),
                });
            }
        }
        TableLayout::VertexRows => {
            if let Some(bad) = rows.iter().find(|r| r.values.len() != 3) {
                return Err(ParseError::Format {
                    line: bad.line,
                    message: format!("Expected 'x y z', got {} values", bad.values.len()),
                });
            }
        }
    }
    Ok(())
}

fn assemble(rows: &[Row], layout: TableLayout) -> Vec<[f64; 3]> {
    match layout {
        TableLayout::AxisRows => (0..rows[0].values.len())
            .map(|i| [rows[0].values[i], rows[1].values[i], rows[2].values[i]])
            .collect(),
        TableLayout::VertexRows => rows
            .iter()
            .map(|r| [r.values[0], r.values[1], r.values[2]])
            .collect(),
    }
}

/// Parse a table file name such as `Octa7_Verts.txt` into its kind and width.
pub fn parse_table_name(file_name: &str) -> Option<(ShapeKind, usize)> {
    let stem = file_name.strip_suffix("_Verts.txt")?;
    ShapeKind::ALL.iter().find_map(|&kind| {
        let prefix = kind.table_prefix()?;
        let width = stem.strip_prefix(prefix)?.parse().ok()?;
        Some((kind, width))
    })
}

/// File name of the table for a given kind and width.
pub fn table_file_name(kind: ShapeKind, width: usize) -> Option<String> {
    kind.table_prefix()
        .map(|prefix| format!("{}{}_Verts.txt", prefix, width))
}

/// In-memory collection of vertex tables keyed by shape kind and width.
#[derive(Debug, Clone, Default)]
pub struct VertexLibrary {
    tables: BTreeMap<(ShapeKind, usize), Vec<[f64; 3]>>,
}

impl VertexLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*_Verts.txt` table found in `dir` and in its
    /// `Tetrahedrons/` and `Octahedrons/` sub-folders.
    ///
    /// Files whose names do not follow the table convention are ignored.
    pub fn load_dir(dir: &Path) -> Result<Self, GeometryError> {
        let mut library = Self::new();
        for folder in [dir.to_path_buf(), dir.join("Tetrahedrons"), dir.join("Octahedrons")] {
            if !folder.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&folder).map_err(ParseError::from)? {
                let path = entry.map_err(ParseError::from)?.path();
                let Some((kind, width)) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(parse_table_name)
                else {
                    continue;
                };
                let content = std::fs::read_to_string(&path).map_err(ParseError::from)?;
                let vertices = parse_vertex_table(&content)?;
                log::debug!(
                    "Loaded {} vertices for {} width {} from {}",
                    vertices.len(),
                    kind,
                    width,
                    path.display()
                );
                library.insert(kind, width, vertices);
            }
        }
        Ok(library)
    }

    /// Register (or replace) the table for a kind and width.
    pub fn insert(&mut self, kind: ShapeKind, width: usize, vertices: Vec<[f64; 3]>) {
        self.tables.insert((kind, width), vertices);
    }

    /// Look up the table for a kind and width.
    pub fn get(&self, kind: ShapeKind, width: usize) -> Option<&[[f64; 3]]> {
        self.tables.get(&(kind, width)).map(Vec::as_slice)
    }

    /// Widths with a table for the given kind, ascending.
    pub fn available_widths(&self, kind: ShapeKind) -> Vec<usize> {
        self.tables
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|&(_, w)| w)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
