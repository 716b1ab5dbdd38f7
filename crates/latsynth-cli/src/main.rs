//! Latsynth command-line interface.
//!
//! Generate labelled lattice image datasets from TOML configuration files:
//! ```sh
//! latsynth generate sweep.toml
//! latsynth validate sweep.toml
//! latsynth blur "Simulated Data" --min 8 --max 8
//! latsynth shapes --vertex-dir Vertices
//! ```

mod blur;
mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use latsynth_geometry::shapes::ShapeKind;
use latsynth_geometry::vertex_table::{table_file_name, VertexLibrary};
use latsynth_render::Renderer;

#[derive(Parser)]
#[command(name = "latsynth")]
#[command(about = "Latsynth: synthetic microscopy images of crystal lattices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every dataset described by a TOML configuration file.
    Generate {
        /// Path to the sweep configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Base random seed (overrides config file setting).
        #[arg(long)]
        seed: Option<u64>,
        /// Render samples in parallel.
        #[arg(long)]
        parallel: bool,
    },
    /// Validate a configuration file without rendering anything.
    Validate {
        /// Path to the sweep configuration file.
        config: PathBuf,
    },
    /// Box-blur every PNG in each sub-folder of a directory.
    Blur {
        /// Directory whose sub-folders hold the images.
        root: PathBuf,
        /// Smallest kernel size.
        #[arg(long, default_value_t = 8)]
        min: u32,
        /// Largest kernel size (inclusive).
        #[arg(long, default_value_t = 8)]
        max: u32,
    },
    /// List shape families and the vertex tables available for them.
    Shapes {
        /// Directory holding vertex tables.
        #[arg(long)]
        vertex_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            output,
            seed,
            parallel,
        } => {
            println!("Latsynth dataset generator");
            println!("==========================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let seed = seed.or(job.seed).unwrap_or_else(rand::random);
            println!("Seed: {}", seed);

            let options = runner::RunOptions {
                seed,
                parallel: parallel || job.parallel,
                out_dir: output.unwrap_or_else(|| PathBuf::from(&job.output.directory)),
            };
            let library = runner::load_library(&job)?;
            let summaries = runner::run_sweep(&job, &library, &options)?;

            for summary in &summaries {
                println!(
                    "  {}: {} images in {}",
                    summary.name,
                    summary.entries.len(),
                    summary.dir.display()
                );
            }
            println!("Generation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            Renderer::new(job.render.clone())?;
            let library = runner::load_library(&job)?;
            let options = runner::RunOptions {
                seed: job.seed.unwrap_or_default(),
                parallel: false,
                out_dir: PathBuf::from(&job.output.directory),
            };
            let plans = runner::plan_sweep(&job, &library, &options)?;
            let total: usize = plans.iter().map(|p| p.samples.len()).sum();
            println!("Configuration is valid: {}", config.display());
            for plan in &plans {
                println!("  {}: {} samples -> {}", plan.name, plan.samples.len(), plan.dir.display());
            }
            println!("  total: {} samples", total);
            Ok(())
        }
        Commands::Blur { root, min, max } => {
            let written = blur::blur_tree(&root, min..=max)?;
            println!("Wrote {} blurred images.", written);
            Ok(())
        }
        Commands::Shapes { vertex_dir } => {
            let library = match &vertex_dir {
                Some(dir) => VertexLibrary::load_dir(dir)?,
                None => VertexLibrary::new(),
            };
            println!("Available shapes:");
            println!();
            for kind in ShapeKind::ALL {
                if kind.requires_table() {
                    let files: Vec<String> = library
                        .available_widths(kind)
                        .into_iter()
                        .filter_map(|w| table_file_name(kind, w))
                        .collect();
                    println!("  {:<12} {:?}", kind.to_string(), files);
                } else {
                    println!("  {:<12} any width (generated)", kind.to_string());
                }
            }
            Ok(())
        }
    }
}
