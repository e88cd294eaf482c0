//! Surface rasterization of a mesh onto a cubic lattice
//!
//! Every lattice cell whose center has a surface point within the query
//! radius, inside the cell's own bounds, receives the surface color at that
//! point. Color resolution runs in parallel per x slice; palette and grid
//! updates happen afterwards on one thread in lattice scan order, so the
//! output does not depend on the thread count.

use crate::bvh::TriangleBvh;
use crate::color::{Color, ColorResolver};
use crate::config::{SizingMode, Threads, VoxelizeConfig, MAX_DETAIL};
use crate::error::{Result, VoxelizeError};
use crate::grid::{world_to_grid_index, VoxelGrid};
use crate::material::MaterialTable;
use crate::mesh::{Aabb, Mesh};
use crate::palette::{default_preset, Palette, PaletteMatch};
use crate::texture::{TextureCache, TextureSource};
use crate::volume::{RasterStats, VoxelVolume};
use glam::{UVec3, Vec3};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Placement of the voxel lattice in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Minimum corner of cell `(0, 0, 0)`
    pub origin: Vec3,
    pub voxel_size: f32,
    pub detail: u32,
    /// Cells along each axis before the early-exit limit
    pub active: UVec3,
}

impl Lattice {
    /// Size the lattice for `bounds` according to the sizing mode
    pub fn new(bounds: &Aabb, config: &VoxelizeConfig) -> Result<Self> {
        let extent = bounds.max_extent();
        let (voxel_size, detail) = match config.sizing {
            SizingMode::ObjectBounds => (extent / config.detail as f32, config.detail),
            SizingMode::SceneUnits => {
                let detail = extent.round_ties_even().clamp(0.0, MAX_DETAIL as f32) as u32;
                (1.0 / config.unit_scale, detail)
            }
        };

        if detail == 0 {
            return Err(VoxelizeError::InvalidDetail(detail));
        }
        if !voxel_size.is_finite() || voxel_size <= 0.0 {
            return Err(VoxelizeError::DegenerateGeometry(format!(
                "voxel size {} derived from extent {}",
                voxel_size, extent
            )));
        }

        let limit = bounds.max + Vec3::splat(config.raster.early_exit_margin * voxel_size);
        let active_along = |origin: f32, limit: f32| {
            (0..detail)
                .take_while(|&i| origin + (i as f32 + 0.5) * voxel_size <= limit)
                .count() as u32
        };
        let active = UVec3::new(
            active_along(bounds.min.x, limit.x),
            active_along(bounds.min.y, limit.y),
            active_along(bounds.min.z, limit.z),
        );

        Ok(Self {
            origin: bounds.min,
            voxel_size,
            detail,
            active,
        })
    }

    /// World-space center of cell `(x, y, z)`
    pub fn center(&self, x: u32, y: u32, z: u32) -> Vec3 {
        self.origin + (UVec3::new(x, y, z).as_vec3() + Vec3::splat(0.5)) * self.voxel_size
    }

    /// Cell that owns `point`
    ///
    /// Cells are half-open, `[min, min + voxel_size)` on each axis, so a point
    /// on a face shared by two cells belongs to the upper one only. Points on
    /// the outer faces of the lattice, or within `tolerance` outside them,
    /// belong to the boundary cells.
    pub fn owning_cell(&self, point: Vec3, tolerance: f32) -> Option<UVec3> {
        let extent = self.voxel_size * self.detail as f32;
        let along = |offset: f32| {
            if offset < -tolerance || offset > extent + tolerance {
                return None;
            }
            let index = (offset / self.voxel_size).floor().max(0.0) as u32;
            Some(index.min(self.detail - 1))
        };

        let offset = point - self.origin;
        Some(UVec3::new(along(offset.x)?, along(offset.y)?, along(offset.z)?))
    }

    /// Whether `point` is owned by `cell`
    pub fn cell_contains(&self, cell: UVec3, point: Vec3, tolerance: f32) -> bool {
        self.owning_cell(point, tolerance) == Some(cell)
    }
}

/// Colors resolved for one x slice, in (y, z) scan order
#[derive(Debug, Default)]
struct SliceSamples {
    samples: Vec<(UVec3, Color)>,
    stats: RasterStats,
}

struct SliceRasterizer<'a> {
    lattice: Lattice,
    bvh: &'a TriangleBvh,
    resolver: &'a ColorResolver<'a>,
    query_radius: f32,
    tolerance: f32,
    alpha_cutoff: f32,
}

impl SliceRasterizer<'_> {
    fn resolve_slice(&self, x: u32) -> SliceSamples {
        let mut slice = SliceSamples::default();
        let stats = &mut slice.stats;

        for y in 0..self.lattice.active.y {
            for z in 0..self.lattice.active.z {
                stats.cells_visited += 1;
                let center = self.lattice.center(x, y, z);

                let Some(hit) = self.bvh.closest_point(center, self.query_radius) else {
                    stats.no_hit += 1;
                    continue;
                };
                let cell = UVec3::new(x, y, z);
                if !self.lattice.cell_contains(cell, hit.location, self.tolerance) {
                    stats.outside_cell += 1;
                    continue;
                }

                let Some(color) = self
                    .resolver
                    .resolve_color(hit.location, hit.normal, hit.triangle)
                else {
                    stats.no_hit += 1;
                    continue;
                };
                if color.a < self.alpha_cutoff {
                    stats.transparent += 1;
                    continue;
                }

                slice.samples.push((cell, color.quantize()));
            }
        }

        slice
    }
}

/// Voxelize the surface of `mesh`
pub fn rasterize(
    mesh: &Mesh,
    materials: &MaterialTable,
    textures: &dyn TextureSource,
    config: &VoxelizeConfig,
) -> Result<VoxelVolume> {
    rasterize_with_progress(mesh, materials, textures, config, &|_, _| {})
}

/// Voxelize the surface of `mesh`, reporting `(completed, total)` x slices
///
/// The callback may be invoked from worker threads.
pub fn rasterize_with_progress(
    mesh: &Mesh,
    materials: &MaterialTable,
    textures: &dyn TextureSource,
    config: &VoxelizeConfig,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> Result<VoxelVolume> {
    config.validate()?;
    let bounds = mesh.validate()?;
    let lattice = Lattice::new(&bounds, config)?;

    debug!(
        "Rasterizing {} triangles: detail {}, voxel size {}, active {}",
        mesh.triangle_count(),
        lattice.detail,
        lattice.voxel_size,
        lattice.active
    );

    let pool = match config.threads {
        Threads::Custom(n) => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
        Threads::Single | Threads::Global => None,
    };

    let bvh = TriangleBvh::build(mesh);
    debug!("Built BVH with {} nodes", bvh.node_count());

    let cache = TextureCache::new(textures);
    let resolver = ColorResolver::new(mesh, materials, &cache)
        .with_surface_nudge(config.raster.surface_nudge);
    let slicer = SliceRasterizer {
        lattice,
        bvh: &bvh,
        resolver: &resolver,
        query_radius: lattice.voxel_size * config.raster.query_radius_factor,
        tolerance: lattice.voxel_size * config.raster.cell_tolerance,
        alpha_cutoff: config.raster.alpha_cutoff,
    };

    let total = lattice.active.x as usize;
    let completed = AtomicUsize::new(0);
    let run_slice = |x: u32| {
        let slice = slicer.resolve_slice(x);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress(done, total);
        slice
    };

    let slices: Vec<SliceSamples> = match (config.threads, &pool) {
        (Threads::Single, _) => (0..lattice.active.x).map(run_slice).collect(),
        (_, Some(pool)) => {
            pool.install(|| (0..lattice.active.x).into_par_iter().map(run_slice).collect())
        }
        (_, None) => (0..lattice.active.x).into_par_iter().map(run_slice).collect(),
    };

    let mut palette = if config.use_default_palette {
        Palette::with_preset(&default_preset(), config.palette)
    } else {
        Palette::new(config.palette)
    };
    let mut grid = VoxelGrid::new(lattice.detail);
    let mut stats = RasterStats::default();

    for slice in slices {
        stats.cells_visited += slice.stats.cells_visited;
        stats.no_hit += slice.stats.no_hit;
        stats.outside_cell += slice.stats.outside_cell;
        stats.transparent += slice.stats.transparent;

        for (cell, color) in slice.samples {
            let found = palette.add_or_match(color);
            match found {
                PaletteMatch::Added(_) => {}
                PaletteMatch::Matched(_) => stats.palette_matched += 1,
                PaletteMatch::Remapped(_) => stats.palette_remapped += 1,
            }

            let slot = u8::try_from(found.index() + 1).unwrap_or(u8::MAX);
            let index = world_to_grid_index(cell.x, cell.y, cell.z, lattice.detail);
            if grid.set(index.x, index.y, index.z, slot) {
                stats.filled += 1;
            }
        }
    }

    info!(
        "Voxelized {} triangles into {}^3 grid: {} voxels, {} palette colors, {} textures",
        mesh.triangle_count(),
        lattice.detail,
        stats.filled,
        palette.len(),
        cache.loaded_count()
    );
    debug!("Raster stats: {:?}", stats);

    Ok(VoxelVolume::assemble(grid, palette.into_colors())
        .with_placement(lattice.origin, lattice.voxel_size)
        .with_stats(stats))
}
