//! Dense cubic voxel grid
//!
//! Storage is indexed `[i][j][k]` with `k` fastest. A lattice cell
//! `(x, y, z)` (x fastest in world space, z up) lands at storage index
//! `(y, detail - 1 - z, x)`; see [`world_to_grid_index`].

use glam::{IVec3, UVec3};

/// Storage index of lattice cell `(x, y, z)`
pub fn world_to_grid_index(x: u32, y: u32, z: u32, detail: u32) -> UVec3 {
    UVec3::new(y, detail - 1 - z, x)
}

/// Lattice cell of storage index `(i, j, k)`; inverse of [`world_to_grid_index`]
pub fn grid_to_world_index(i: u32, j: u32, k: u32, detail: u32) -> UVec3 {
    UVec3::new(k, i, detail - 1 - j)
}

/// `detail³` array of palette slots; `0` is empty, `n` is palette entry `n - 1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    detail: u32,
    cells: Vec<u8>,
}

impl VoxelGrid {
    pub fn new(detail: u32) -> Self {
        let side = detail as usize;
        Self {
            detail,
            cells: vec![0; side * side * side],
        }
    }

    pub fn detail(&self) -> u32 {
        self.detail
    }

    fn offset(&self, i: u32, j: u32, k: u32) -> Option<usize> {
        if i >= self.detail || j >= self.detail || k >= self.detail {
            return None;
        }
        let d = self.detail as usize;
        Some((i as usize * d + j as usize) * d + k as usize)
    }

    /// Slot at storage index `(i, j, k)`, `None` outside the grid
    pub fn get(&self, i: u32, j: u32, k: u32) -> Option<u8> {
        self.offset(i, j, k).map(|o| self.cells[o])
    }

    /// Write a slot; returns `false` outside the grid
    pub fn set(&mut self, i: u32, j: u32, k: u32, value: u8) -> bool {
        match self.offset(i, j, k) {
            Some(o) => {
                self.cells[o] = value;
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    /// Nonzero cells as `(storage index, slot)`, in storage order
    pub fn iter_occupied(&self) -> impl Iterator<Item = (IVec3, u8)> + '_ {
        let d = self.detail as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(move |(o, &v)| {
                let k = o % d;
                let j = (o / d) % d;
                let i = o / (d * d);
                (IVec3::new(i as i32, j as i32, k as i32), v)
            })
    }
}
