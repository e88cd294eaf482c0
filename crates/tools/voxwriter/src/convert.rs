//! OBJ to `.vox` conversion pipeline

use crate::error::Result;
use crate::obj::load_obj;
use crate::settings::Settings;
use crate::vox::save_vox;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use voxelizer::{rasterize_with_progress, ImageTextureSource, RasterStats};

/// Summary of a finished conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub model_count: usize,
    pub triangle_count: usize,
    pub detail: u32,
    pub voxel_size: f32,
    pub voxel_count: usize,
    pub palette_len: usize,
    pub stats: RasterStats,
    pub elapsed: Duration,
}

/// Voxelize `input` and write the result to `output`
///
/// `progress` receives `(completed, total)` lattice slices.
pub fn convert(
    input: &Path,
    output: &Path,
    settings: &Settings,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> Result<ConvertReport> {
    let start = Instant::now();

    let scene = load_obj(input, settings.up_axis)?;
    info!(
        "Loaded {}: {} models, {} triangles, {} materials",
        input.display(),
        scene.model_count,
        scene.mesh.triangle_count(),
        scene.materials.len()
    );

    let textures = ImageTextureSource::new(&scene.texture_root);
    let volume = rasterize_with_progress(
        &scene.mesh,
        &scene.materials,
        &textures,
        &settings.voxelize,
        progress,
    )?;

    let data = save_vox(output, &volume)?;
    let voxel_count: usize = data.models.iter().map(|m| m.voxels.len()).sum();
    let elapsed = start.elapsed();

    info!(
        "Exported {} voxels with {} colors to {} in {:.2}s",
        voxel_count,
        volume.palette().len(),
        output.display(),
        elapsed.as_secs_f64()
    );

    Ok(ConvertReport {
        output: output.to_path_buf(),
        model_count: scene.model_count,
        triangle_count: scene.mesh.triangle_count(),
        detail: volume.detail(),
        voxel_size: volume.voxel_size(),
        voxel_count,
        palette_len: volume.palette().len(),
        stats: *volume.stats(),
        elapsed,
    })
}
