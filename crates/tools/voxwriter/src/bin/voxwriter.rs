//! Voxwriter CLI - OBJ to MagicaVoxel conversion
//!
//! Command-line interface for voxelizing textured meshes into `.vox` files.

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use voxwriter::{convert, read_vox, summarize, Overrides, Settings, UpAxis};

#[derive(Parser)]
#[command(name = "voxwriter")]
#[command(author, version, about = "Convert textured OBJ meshes into MagicaVoxel .vox models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Voxelize an OBJ file
    Convert {
        /// Input OBJ file (MTL and textures are resolved next to it)
        input: PathBuf,

        /// Output file path (.vox)
        #[arg(short, long)]
        output: PathBuf,

        /// Lattice side length in voxels (1-256)
        #[arg(short, long)]
        detail: Option<u32>,

        /// Seed the palette with the MagicaVoxel default palette
        #[arg(long)]
        default_palette: bool,

        /// Size voxels in scene units instead of fitting the object
        #[arg(long, requires = "unit_scale")]
        scene_units: bool,

        /// Voxels per scene unit (0.01-256), used with --scene-units
        #[arg(long, requires = "scene_units")]
        unit_scale: Option<f32>,

        /// Worker threads (default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Up axis of the OBJ file
        #[arg(long, value_enum)]
        up_axis: Option<UpAxis>,

        /// TOML settings file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show information about a .vox file
    Info {
        /// Path to the .vox file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            detail,
            default_palette,
            scene_units: _,
            unit_scale,
            threads,
            up_axis,
            config,
        } => {
            let settings = match &config {
                Some(path) => Settings::load(path)
                    .with_context(|| format!("Failed to load settings from {}", path.display()))?,
                None => Settings::default(),
            };
            let settings = settings.apply(&Overrides {
                detail,
                default_palette,
                unit_scale,
                threads,
                up_axis,
            });

            let progress = ProgressBar::new(0);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} slices")?
                    .progress_chars("#>-"),
            );

            let report = convert(&input, &output, &settings, &|_, total| {
                progress.set_length(total as u64);
                progress.inc(1);
            })
            .with_context(|| format!("Failed to convert {}", input.display()))?;
            progress.finish_and_clear();

            println!("Exported {}", report.output.display());
            println!("  Models:      {}", report.model_count);
            println!("  Triangles:   {}", report.triangle_count);
            println!(
                "  Grid:        {0}x{0}x{0} (voxel size {1})",
                report.detail, report.voxel_size
            );
            println!("  Voxels:      {}", report.voxel_count);
            println!("  Palette:     {} colors", report.palette_len);
            println!(
                "  Skipped:     {} transparent, {} outside cell",
                report.stats.transparent, report.stats.outside_cell
            );
            println!("Took {:.2} seconds", report.elapsed.as_secs_f64());
        }

        Commands::Info { file } => {
            let data = read_vox(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = summarize(&data);

            println!("{}", file.display());
            println!("  Version: {}", summary.version);
            println!("  Palette: {} entries", summary.palette_len);
            for (i, model) in summary.models.iter().enumerate() {
                let [x, y, z] = model.size;
                println!(
                    "  Model {}: {}x{}x{}, {} voxels, {} colors",
                    i, x, y, z, model.voxel_count, model.colors_used
                );
            }
        }
    }

    Ok(())
}
