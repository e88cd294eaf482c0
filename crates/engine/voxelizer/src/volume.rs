//! Voxelization output

use crate::color::Color;
use crate::grid::VoxelGrid;
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Per-run counters for cells that were recovered locally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterStats {
    /// Lattice cells evaluated (excluding early-exit skips)
    pub cells_visited: usize,
    /// No surface within the query radius
    pub no_hit: usize,
    /// Nearest surface point belonged to a neighbouring cell
    pub outside_cell: usize,
    /// Resolved alpha below the cutoff
    pub transparent: usize,
    /// Cells written to the grid
    pub filled: usize,
    /// Colors that merged into an existing entry under the threshold
    pub palette_matched: usize,
    /// Colors remapped to the nearest entry of a full palette
    pub palette_remapped: usize,
}

/// Dense voxel grid plus the palette its slots refer to
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelVolume {
    grid: VoxelGrid,
    palette: Vec<Color>,
    stats: RasterStats,
    voxel_size: f32,
    origin: Vec3,
}

impl VoxelVolume {
    /// Package a finished grid and palette
    pub fn assemble(grid: VoxelGrid, palette: Vec<Color>) -> Self {
        Self {
            grid,
            palette,
            stats: RasterStats::default(),
            voxel_size: 1.0,
            origin: Vec3::ZERO,
        }
    }

    /// Attach the world placement of the lattice
    pub fn with_placement(mut self, origin: Vec3, voxel_size: f32) -> Self {
        self.origin = origin;
        self.voxel_size = voxel_size;
        self
    }

    pub fn with_stats(mut self, stats: RasterStats) -> Self {
        self.stats = stats;
        self
    }

    /// Lattice side length
    pub fn detail(&self) -> u32 {
        self.grid.detail()
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn stats(&self) -> &RasterStats {
        &self.stats
    }

    /// World-space edge length of one voxel
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// World-space minimum corner of the lattice
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn occupied_count(&self) -> usize {
        self.grid.occupied_count()
    }

    /// Occupied cells as `(storage index, palette slot)`; slot `n` is palette entry `n - 1`
    pub fn voxels(&self) -> impl Iterator<Item = (IVec3, u8)> + '_ {
        self.grid.iter_occupied()
    }

    /// Palette color of an occupied slot
    pub fn color_of(&self, slot: u8) -> Option<Color> {
        (slot as usize)
            .checked_sub(1)
            .and_then(|i| self.palette.get(i).copied())
    }

    pub fn into_parts(self) -> (VoxelGrid, Vec<Color>) {
        (self.grid, self.palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_and_parts() {
        let mut grid = VoxelGrid::new(2);
        grid.set(0, 0, 1, 1);
        let palette = vec![Color::rgb(10, 20, 30)];

        let volume = VoxelVolume::assemble(grid.clone(), palette.clone())
            .with_placement(Vec3::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(volume.detail(), 2);
        assert_eq!(volume.occupied_count(), 1);
        assert_eq!(volume.voxel_size(), 0.5);
        assert_eq!(volume.origin(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(volume.stats(), &RasterStats::default());

        let (slot_index, slot) = volume.voxels().next().unwrap();
        assert_eq!(slot_index, IVec3::new(0, 0, 1));
        assert_eq!(volume.color_of(slot), Some(Color::rgb(10, 20, 30)));
        assert_eq!(volume.color_of(0), None);
        assert_eq!(volume.color_of(2), None);

        assert_eq!(volume.into_parts(), (grid, palette));
    }
}
