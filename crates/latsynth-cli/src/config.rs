//! TOML configuration deserialisation for dataset sweeps.

use serde::Deserialize;

use latsynth_core::types::{DefectPolicy, NoiseStage, ProjectionConfig};
use latsynth_geometry::shapes::ShapeKind;
use latsynth_render::RenderConfig;

/// Top-level sweep configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    /// Base seed. Drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Render samples on all cores, one renderer per worker.
    #[serde(default)]
    pub parallel: bool,
    /// Directory holding `Tetra*_Verts.txt` / `Octa*_Verts.txt` tables.
    #[serde(default)]
    pub vertex_dir: Option<String>,
    pub shape: ShapeConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub noise: NoiseSection,
    #[serde(default)]
    pub defects: DefectSection,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "dataset")]
    pub datasets: Vec<DatasetConfig>,
}

/// Shape family and sizes.
#[derive(Debug, Deserialize)]
pub struct ShapeConfig {
    pub kind: ShapeKind,
    pub widths: Vec<usize>,
    #[serde(default = "default_lattice_spacing")]
    pub lattice_spacing: f64,
}

fn default_lattice_spacing() -> f64 {
    0.75
}

/// A list of values, either explicit or as a half-open stepped range.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Range { range: [f64; 2], step: f64 },
    List(Vec<f64>),
}

impl ValueSpec {
    /// Expand into concrete values. Ranges exclude their end point.
    pub fn values(&self) -> anyhow::Result<Vec<f64>> {
        match self {
            ValueSpec::List(values) => Ok(values.clone()),
            ValueSpec::Range { range, step } => {
                if !(*step > 0.0) {
                    anyhow::bail!("Range step must be positive, got {}", step);
                }
                let [start, end] = *range;
                // Tolerance keeps float rounding from adding a value at `end`.
                let count = ((end - start) / step - 1e-9).ceil().max(0.0) as usize;
                Ok((0..count).map(|i| start + i as f64 * step).collect())
            }
        }
    }
}

impl Default for ValueSpec {
    fn default() -> Self {
        ValueSpec::List(vec![0.0])
    }
}

/// Rotation sweep (degrees).
#[derive(Debug, Default, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub rx: ValueSpec,
    #[serde(default)]
    pub ry: ValueSpec,
    #[serde(default)]
    pub rz: ValueSpec,
}

/// Positional error: fixed, or drawn uniformly once per dataset.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum PosErrorSpec {
    Fixed(f64),
    Uniform([f64; 2]),
}

impl Default for PosErrorSpec {
    fn default() -> Self {
        PosErrorSpec::Fixed(0.0)
    }
}

/// Noise settings from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct NoiseSection {
    #[serde(default)]
    pub pos_error: PosErrorSpec,
    #[serde(default)]
    pub stage: NoiseStage,
}

/// Defect removal settings from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct DefectSection {
    #[serde(default)]
    pub policy: DefectPolicy,
}

/// One dataset (e.g. training or testing) in the sweep.
#[derive(Debug, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    /// Directory relative to the output directory. Defaults to the name.
    #[serde(default)]
    pub subdirectory: Option<String>,
    /// Defect fractions to sweep.
    pub defects: ValueSpec,
    /// How many samples per parameter combination.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_iterations() -> usize {
    1
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./Simulated Data").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Image file extension (default: "png").
    #[serde(default = "default_file_type")]
    pub file_type: String,
    /// Whether to write `manifest.json` per dataset (default: true).
    #[serde(default = "default_true")]
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            file_type: default_file_type(),
            manifest: true,
        }
    }
}

fn default_output_dir() -> String {
    "./Simulated Data".into()
}
fn default_file_type() -> String {
    "png".into()
}
fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a TOML job configuration.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    if config.datasets.is_empty() {
        anyhow::bail!("Configuration needs at least one [[dataset]] entry");
    }
    if config.shape.widths.is_empty() {
        anyhow::bail!("[shape] widths must not be empty");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use latsynth_render::BlurKind;

    const EXAMPLE: &str = r#"
seed = 42

[shape]
kind = "cube"
widths = [11, 12]
lattice_spacing = 0.75

[sweep]
rx = { range = [0, 50], step = 10 }
ry = [0, 10, 20]

[noise]
pos_error = [0.04, 0.06]

[render.secondary_blur]
kind = "gaussian"
kernel = 5

[output]
directory = "Training Data"

[[dataset]]
name = "train"
defects = { range = [0, 0.35], step = 0.05 }
iterations = 5

[[dataset]]
name = "test"
subdirectory = "Test"
defects = [0.0, 0.07, 0.14, 0.21, 0.28]
"#;

    #[test]
    fn test_parse_example() {
        let config = parse_config(EXAMPLE).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.shape.kind, ShapeKind::Cube);
        assert_eq!(config.sweep.rx.values().unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(config.sweep.ry.values().unwrap(), vec![0.0, 10.0, 20.0]);
        assert_eq!(config.sweep.rz.values().unwrap(), vec![0.0]);
        assert!(matches!(config.noise.pos_error, PosErrorSpec::Uniform([lo, hi]) if lo == 0.04 && hi == 0.06));
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[0].defects.values().unwrap().len(), 7);
        assert_eq!(config.datasets[0].iterations, 5);
        assert_eq!(config.datasets[1].iterations, 1);
        assert_eq!(config.datasets[1].subdirectory.as_deref(), Some("Test"));

        let blur = config.render.secondary_blur.unwrap();
        assert_eq!(blur.kind, BlurKind::Gaussian);
        assert_eq!(blur.kernel, 5);
        assert_eq!(config.render.canvas_px, 300);
        assert_eq!(config.output.directory, "Training Data");
        assert_eq!(config.output.file_type, "png");
    }

    #[test]
    fn test_fixed_pos_error_and_defaults() {
        let config = parse_config(
            "[shape]\nkind = \"octahedron\"\nwidths = [3]\n\n[noise]\npos_error = 0.05\n\n[[dataset]]\nname = \"all\"\ndefects = [0.0]\n",
        )
        .unwrap();
        assert!(matches!(config.noise.pos_error, PosErrorSpec::Fixed(v) if v == 0.05));
        assert_eq!(config.shape.lattice_spacing, 0.75);
        assert!(!config.parallel);
        assert_eq!(config.projection.drift, 2.0);
    }

    #[test]
    fn test_missing_dataset_rejected() {
        assert!(parse_config("dataset = []\n\n[shape]\nkind = \"cube\"\nwidths = [3]\n").is_err());
    }

    #[test]
    fn test_shipped_cube_sweep() {
        let config = parse_config(include_str!("../../../configs/cube_sweep.toml")).unwrap();
        assert_eq!(config.sweep.ry.values().unwrap().len(), 5);
        assert_eq!(config.datasets[1].defects.values().unwrap().len(), 5);
        assert!(config.render.validate().is_ok());

        let angles = config.sweep.rx.values().unwrap().len()
            * config.sweep.ry.values().unwrap().len()
            * config.sweep.rz.values().unwrap().len();
        let counts: Vec<usize> = config
            .datasets
            .iter()
            .map(|d| {
                assert_eq!(d.iterations, 5, "dataset {}", d.name);
                config.shape.widths.len() * angles * d.defects.values().unwrap().len() * d.iterations
            })
            .collect();
        assert_eq!(counts, vec![2 * 5 * 5 * 7 * 5, 2 * 5 * 5 * 5 * 5]);
    }

    #[test]
    fn test_bad_range_step() {
        let spec = ValueSpec::Range { range: [0.0, 1.0], step: 0.0 };
        assert!(spec.values().is_err());
    }
}
