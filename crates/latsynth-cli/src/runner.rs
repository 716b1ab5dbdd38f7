//! Sweep runner: expands a job into samples, generates and renders them, and
//! writes a manifest per dataset.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use latsynth_core::pipeline::generate;
use latsynth_core::types::{DefectConfig, GenerationParams, NoiseConfig, SampleLabel};
use latsynth_geometry::shapes::ShapeSpec;
use latsynth_geometry::transform::EulerAngles;
use latsynth_geometry::vertex_table::{table_file_name, VertexLibrary};
use latsynth_geometry::GeometryError;
use latsynth_render::renderer::output_paths;
use latsynth_render::{RenderConfig, Renderer};

use crate::config::{DatasetConfig, JobConfig, PosErrorSpec};

/// Run-time settings resolved from the config file and command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed: u64,
    pub parallel: bool,
    pub out_dir: PathBuf,
}

/// One sample of a dataset.
#[derive(Debug, Clone)]
pub struct Sample {
    pub index: usize,
    pub params: GenerationParams,
    pub label: SampleLabel,
}

/// A dataset with its parameters fixed and its samples enumerated.
#[derive(Debug, Clone)]
pub struct DatasetPlan {
    pub name: String,
    pub dir: PathBuf,
    /// Positional error used for every sample in this dataset.
    pub pos_error: f64,
    /// Seed from which each sample's random source is derived.
    pub seed: u64,
    pub samples: Vec<Sample>,
}

/// Per-sample manifest record.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub label: SampleLabel,
    /// Sharp image, relative to the dataset directory.
    pub image: String,
    /// Blurred variant, relative to the dataset directory.
    pub blurred: Option<String>,
    pub points: usize,
    pub removed: usize,
    pub drift: [f64; 2],
}

/// Contents of `manifest.json`.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub dataset: &'a str,
    pub seed: u64,
    pub pos_error: f64,
    pub lattice_spacing: f64,
    pub samples: &'a [ManifestEntry],
}

/// Summary of a finished dataset.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub name: String,
    pub dir: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

/// Load vertex tables from the configured directory, or return an empty
/// library for cube-only jobs.
pub fn load_library(job: &JobConfig) -> Result<VertexLibrary> {
    match &job.vertex_dir {
        Some(dir) => {
            let library = VertexLibrary::load_dir(Path::new(dir))
                .with_context(|| format!("Failed to load vertex tables from '{}'", dir))?;
            log::info!("Loaded {} vertex tables from {}", library.len(), dir);
            Ok(library)
        }
        None => Ok(VertexLibrary::new()),
    }
}

fn resolve_pos_error<R: Rng + ?Sized>(spec: PosErrorSpec, rng: &mut R) -> Result<f64> {
    match spec {
        PosErrorSpec::Fixed(value) => Ok(value),
        PosErrorSpec::Uniform([lo, hi]) => {
            if !(lo <= hi) {
                anyhow::bail!("pos_error range [{}, {}] is empty", lo, hi);
            }
            if lo == hi {
                Ok(lo)
            } else {
                Ok(rng.gen_range(lo..hi))
            }
        }
    }
}

/// Expand a job into dataset plans.
///
/// Every parameter set is validated here, so a plan that builds will not
/// fail on configuration errors half way through the sweep.
pub fn plan_sweep(job: &JobConfig, library: &VertexLibrary, opts: &RunOptions) -> Result<Vec<DatasetPlan>> {
    let kind = job.shape.kind;
    if kind.requires_table() {
        for &width in &job.shape.widths {
            if library.get(kind, width).is_none() {
                let err = anyhow::Error::from(GeometryError::InvalidWidth {
                    kind,
                    width,
                    available: library.available_widths(kind),
                });
                let file = table_file_name(kind, width).unwrap_or_default();
                let dir = job.vertex_dir.as_deref().unwrap_or("<no vertex_dir>");
                return Err(err.context(format!("Missing vertex table '{}' in {}", file, dir)));
            }
        }
    }

    let rx = job.sweep.rx.values().context("[sweep] rx")?;
    let ry = job.sweep.ry.values().context("[sweep] ry")?;
    let rz = job.sweep.rz.values().context("[sweep] rz")?;

    let mut master = StdRng::seed_from_u64(opts.seed);
    let mut plans = Vec::with_capacity(job.datasets.len());

    for dataset in &job.datasets {
        let pos_error = resolve_pos_error(job.noise.pos_error, &mut master)?;
        let seed: u64 = master.gen();
        let samples = plan_samples(job, dataset, pos_error, [&rx, &ry, &rz])
            .with_context(|| format!("Dataset '{}'", dataset.name))?;

        let subdir = dataset.subdirectory.as_deref().unwrap_or(&dataset.name);
        plans.push(DatasetPlan {
            name: dataset.name.clone(),
            dir: opts.out_dir.join(subdir),
            pos_error,
            seed,
            samples,
        });
    }
    Ok(plans)
}

fn plan_samples(job: &JobConfig, dataset: &DatasetConfig, pos_error: f64, angles: [&[f64]; 3]) -> Result<Vec<Sample>> {
    let [rx_values, ry_values, rz_values] = angles;
    let defects = dataset.defects.values()?;
    let mut samples = Vec::new();

    for &rz in rz_values {
        for &ry in ry_values {
            for &rx in rx_values {
                for &width in &job.shape.widths {
                    let shape = ShapeSpec::new(job.shape.kind, width, job.shape.lattice_spacing)?;
                    for &fraction in &defects {
                        for iteration in 0..dataset.iterations {
                            let params = GenerationParams {
                                shape,
                                angles: EulerAngles::new(rx, ry, rz),
                                defects: DefectConfig::new(fraction).with_policy(job.defects.policy),
                                noise: NoiseConfig {
                                    pos_error,
                                    stage: job.noise.stage,
                                },
                                projection: job.projection,
                            };
                            params.validate()?;
                            samples.push(Sample {
                                index: samples.len(),
                                label: SampleLabel::from_params(&params, iteration),
                                params,
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(samples)
}

/// Generate and render every sample in `plan`, then write its manifest.
pub fn run_dataset(
    plan: &DatasetPlan,
    render: &RenderConfig,
    library: &VertexLibrary,
    file_type: &str,
    parallel: bool,
) -> Result<Vec<ManifestEntry>> {
    let total = plan.samples.len();
    let done = AtomicUsize::new(0);
    println!("Dataset '{}': {} samples -> {}", plan.name, total, plan.dir.display());

    let process = |renderer: &mut Renderer, sample: &Sample| -> Result<ManifestEntry> {
        let entry = render_sample(plan, sample, renderer, library, file_type)?;
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        println!("Generating sample {} of {}.", n, total);
        log::info!("{}: sample {} of {} ({})", plan.name, n, total, entry.image);
        Ok(entry)
    };

    let entries = if parallel {
        plan.samples
            .par_iter()
            .map_init(
                || Renderer::new(render.clone()),
                |renderer, sample| {
                    let renderer = renderer
                        .as_mut()
                        .map_err(|e| anyhow::anyhow!("Renderer setup failed: {}", e))?;
                    process(renderer, sample)
                },
            )
            .collect::<Result<Vec<_>>>()?
    } else {
        let mut renderer = Renderer::new(render.clone())?;
        plan.samples
            .iter()
            .map(|sample| process(&mut renderer, sample))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(entries)
}

fn render_sample(
    plan: &DatasetPlan,
    sample: &Sample,
    renderer: &mut Renderer,
    library: &VertexLibrary,
    file_type: &str,
) -> Result<ManifestEntry> {
    let mut rng = StdRng::seed_from_u64(plan.seed.wrapping_add(sample.index as u64));
    let label = &sample.label;

    let generated = generate(&sample.params, library, &mut rng)
        .with_context(|| format!("Generating '{}'", label.file_stem()))?;

    let image = label.file_name(file_type);
    let blurred = renderer.config().secondary_blur.map(|blur| {
        (
            label.blurred_subdir(),
            label.blurred_file_name(blur.kernel, file_type),
        )
    });
    let blurred_rel = blurred.as_ref().map(|(dir, name)| dir.join(name));
    let paths = output_paths(&plan.dir, &image, blurred);

    renderer
        .render_to(&generated.projection, label.width, &paths, &mut rng)
        .with_context(|| format!("Rendering '{}'", paths.sharp.display()))?;

    Ok(ManifestEntry {
        label: label.clone(),
        image,
        blurred: blurred_rel.map(|p| p.to_string_lossy().into_owned()),
        points: generated.projection.len(),
        removed: generated.removed,
        drift: generated.drift_offset,
    })
}

/// Write `manifest.json` into the dataset directory.
pub fn write_manifest(plan: &DatasetPlan, lattice_spacing: f64, entries: &[ManifestEntry]) -> Result<PathBuf> {
    std::fs::create_dir_all(&plan.dir)?;
    let manifest = Manifest {
        dataset: &plan.name,
        seed: plan.seed,
        pos_error: plan.pos_error,
        lattice_spacing,
        samples: entries,
    };
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    let path = plan.dir.join("manifest.json");
    std::fs::write(&path, json)?;

    println!("Manifest written to: {}", path.display());
    Ok(path)
}

/// Run every dataset of a job.
pub fn run_sweep(job: &JobConfig, library: &VertexLibrary, opts: &RunOptions) -> Result<Vec<DatasetSummary>> {
    let plans = plan_sweep(job, library, opts)?;
    let mut summaries = Vec::with_capacity(plans.len());

    for plan in &plans {
        println!("  pos_error = {:.4}", plan.pos_error);
        let entries = run_dataset(plan, &job.render, library, &job.output.file_type, opts.parallel)?;
        if job.output.manifest {
            write_manifest(plan, job.shape.lattice_spacing, &entries)?;
        }
        summaries.push(DatasetSummary {
            name: plan.name.clone(),
            dir: plan.dir.clone(),
            entries,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const SMALL_JOB: &str = r#"
seed = 9

[shape]
kind = "cube"
widths = [2, 3]
lattice_spacing = 1.0

[sweep]
rx = [0, 10]

[noise]
pos_error = [0.04, 0.06]

[render]
canvas_px = 60
output_size = 16

[render.speckle]
count = 50

[render.secondary_blur]
kind = "box"
kernel = 3

[[dataset]]
name = "train"
subdirectory = ""
defects = [0.0, 0.5]
iterations = 2

[[dataset]]
name = "test"
subdirectory = "Test"
defects = [0.25]
"#;

    fn options(dir: &Path, parallel: bool) -> RunOptions {
        RunOptions {
            seed: 9,
            parallel,
            out_dir: dir.to_path_buf(),
        }
    }

    fn count_files(dir: &Path, ext: &str) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(ext))
            .count()
    }

    #[test]
    fn test_plan_counts_and_order() {
        let job = parse_config(SMALL_JOB).unwrap();
        let plans = plan_sweep(&job, &VertexLibrary::new(), &options(Path::new("out"), false)).unwrap();
        assert_eq!(plans.len(), 2);
        // |w| · |rx| · |ry| · |rz| · |d| · iters
        assert_eq!(plans[0].samples.len(), 2 * 2 * 1 * 1 * 2 * 2);
        assert_eq!(plans[1].samples.len(), 2 * 2);
        assert_eq!(plans[1].dir, Path::new("out").join("Test"));

        let first = &plans[0].samples[0].label;
        assert_eq!(first.file_stem(), "Cube W2 RX0 RY0 D0 0");
        let last = &plans[0].samples.last().unwrap().label;
        assert_eq!(last.file_stem(), "Cube W3 RX10 RY0 D50 1");

        for plan in &plans {
            assert!((0.04..0.06).contains(&plan.pos_error));
            assert!(plan.samples.iter().all(|s| s.params.noise.pos_error == plan.pos_error));
        }
    }

    #[test]
    fn test_shipped_cube_sweep_sample_counts() {
        let job = parse_config(include_str!("../../../configs/cube_sweep.toml")).unwrap();
        let plans = plan_sweep(&job, &VertexLibrary::new(), &options(Path::new("out"), false)).unwrap();
        let counts: Vec<usize> = plans.iter().map(|p| p.samples.len()).collect();
        assert_eq!(counts, vec![1750, 1250]);
        assert_eq!(plans[0].dir, Path::new("out"));
        assert_eq!(plans[1].dir, Path::new("out").join("Test"));
    }

    #[test]
    fn test_missing_vertex_table_fails_planning() {
        let job = parse_config(&SMALL_JOB.replace("kind = \"cube\"", "kind = \"tetrahedron\"")).unwrap();
        let err = plan_sweep(&job, &VertexLibrary::new(), &options(Path::new("out"), false)).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Tetra2_Verts.txt"), "got: {}", message);
        assert!(message.contains("width 2"), "got: {}", message);
    }

    #[test]
    fn test_sweep_writes_images_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let job = parse_config(SMALL_JOB).unwrap();
        let summaries = run_sweep(&job, &VertexLibrary::new(), &options(dir.path(), false)).unwrap();

        assert_eq!(summaries[0].entries.len(), 16);
        assert_eq!(count_files(dir.path(), "png"), 16);
        assert_eq!(count_files(&dir.path().join("Train").join("RX0"), "png"), 8);
        assert_eq!(count_files(&dir.path().join("Train").join("RX10"), "png"), 8);
        assert_eq!(count_files(&dir.path().join("Test"), "png"), 4);

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("manifest.json")).unwrap()).unwrap();
        let samples = manifest["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 16);
        assert_eq!(samples[0]["image"], "Cube W2 RX0 RY0 D0 0.png");
        assert_eq!(samples[0]["points"], 8);
        // Half of a 27-point cube is 13 points removed.
        assert_eq!(samples[15]["removed"], 13);

        let blurred = image::open(dir.path().join("Train/RX0/Cube W2 RX0 RY0 D0 0 B3.png")).unwrap();
        assert_eq!((blurred.width(), blurred.height()), (16, 16));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let job = parse_config(SMALL_JOB).unwrap();
        let seq = tempfile::tempdir().unwrap();
        let par = tempfile::tempdir().unwrap();
        run_sweep(&job, &VertexLibrary::new(), &options(seq.path(), false)).unwrap();
        run_sweep(&job, &VertexLibrary::new(), &options(par.path(), true)).unwrap();

        for name in ["Cube W2 RX0 RY0 D0 0.png", "Cube W3 RX10 RY0 D50 1.png", "Test/Cube W3 RX10 RY0 D25 0.png"] {
            let a = std::fs::read(seq.path().join(name)).unwrap();
            let b = std::fs::read(par.path().join(name)).unwrap();
            assert_eq!(a, b, "{} differs between runs", name);
        }
    }
}
