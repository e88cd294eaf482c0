//! MagicaVoxel `.vox` container
//!
//! Builds single-model v150 documents (`SIZE`, `XYZI`, `RGBA` chunks) from a
//! voxelized volume, and reads files back for inspection. Both directions go
//! through `dot_vox`.

use crate::error::{Result, VoxWriterError};
use dot_vox::{DotVoxData, Model, Size, Voxel, DEFAULT_INDEX_MAP};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use voxelizer::{grid_to_world_index, VoxelVolume};

const VOX_VERSION: u32 = 150;
const PALETTE_LEN: usize = 256;
const MAX_SIZE: u32 = 256;

/// Single-model document for a voxelized volume
///
/// Voxel `(x, y, z)` is the lattice cell of the Z-up source. dot_vox stores
/// palette indices 0-based, so `Voxel::i` is the grid slot minus one and
/// palette entry `n` is the color of slot `n + 1`.
pub fn vox_data(volume: &VoxelVolume) -> Result<DotVoxData> {
    let detail = volume.detail();
    if !(1..=MAX_SIZE).contains(&detail) {
        return Err(VoxWriterError::InvalidVox(format!(
            "model size {} is outside 1..={}",
            detail, MAX_SIZE
        )));
    }
    if volume.palette().len() >= PALETTE_LEN {
        return Err(VoxWriterError::InvalidVox(format!(
            "palette has {} colors, at most {} fit",
            volume.palette().len(),
            PALETTE_LEN - 1
        )));
    }

    let voxels = volume
        .voxels()
        .filter(|&(_, slot)| slot != 0)
        .map(|(index, slot)| {
            let index = index.as_uvec3();
            let cell = grid_to_world_index(index.x, index.y, index.z, detail);
            Voxel {
                x: cell.x as u8,
                y: cell.y as u8,
                z: cell.z as u8,
                i: slot - 1,
            }
        })
        .collect();

    let mut palette = vec![
        dot_vox::Color {
            r: 0,
            g: 0,
            b: 0,
            a: 0
        };
        PALETTE_LEN
    ];
    for (entry, color) in palette.iter_mut().zip(volume.palette()) {
        *entry = dot_vox::Color {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
    }

    Ok(DotVoxData {
        version: VOX_VERSION,
        index_map: DEFAULT_INDEX_MAP.to_vec(),
        models: vec![Model {
            size: Size {
                x: detail,
                y: detail,
                z: detail,
            },
            voxels,
        }],
        palette,
        materials: Vec::new(),
        scenes: Vec::new(),
        layers: Vec::new(),
    })
}

/// Check that a document fits the `.vox` limits
pub fn validate(data: &DotVoxData) -> Result<()> {
    if data.palette.len() > PALETTE_LEN {
        return Err(VoxWriterError::InvalidVox(format!(
            "palette has {} entries, at most {} fit",
            data.palette.len(),
            PALETTE_LEN
        )));
    }

    for model in &data.models {
        let Size { x, y, z } = model.size;
        if [x, y, z].iter().any(|s| !(1..=MAX_SIZE).contains(s)) {
            return Err(VoxWriterError::InvalidVox(format!(
                "model size {}x{}x{} is outside 1..={} per axis",
                x, y, z, MAX_SIZE
            )));
        }
        for v in &model.voxels {
            if v.x as u32 >= x || v.y as u32 >= y || v.z as u32 >= z {
                return Err(VoxWriterError::InvalidVox(format!(
                    "voxel ({}, {}, {}) outside model",
                    v.x, v.y, v.z
                )));
            }
            // Written 1-based; 255 would wrap to the reserved slot 0
            if v.i as usize >= PALETTE_LEN - 1 {
                return Err(VoxWriterError::InvalidVox(format!(
                    "palette index {} has no slot",
                    v.i
                )));
            }
        }
    }
    Ok(())
}

/// Serialize a document after checking it
pub fn write_vox<W: Write>(writer: &mut W, data: &DotVoxData) -> Result<()> {
    validate(data)?;
    data.write_vox(writer)?;
    Ok(())
}

/// Write a volume to a `.vox` file
pub fn save_vox(path: &Path, volume: &VoxelVolume) -> Result<DotVoxData> {
    let data = vox_data(volume)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_vox(&mut writer, &data)?;
    writer.flush()?;
    Ok(data)
}

/// Contents of a `.vox` file as reported by `voxwriter info`
#[derive(Debug, Clone, PartialEq)]
pub struct VoxSummary {
    pub version: u32,
    pub models: Vec<ModelSummary>,
    pub palette_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub size: [u32; 3],
    pub voxel_count: usize,
    /// Distinct palette slots referenced by voxels
    pub colors_used: usize,
}

/// Parse a `.vox` file with `dot_vox`
pub fn read_vox(path: &Path) -> Result<DotVoxData> {
    let bytes = std::fs::read(path)?;
    dot_vox::load_bytes(&bytes).map_err(|e| VoxWriterError::VoxParse(e.to_string()))
}

pub fn summarize(data: &DotVoxData) -> VoxSummary {
    let models = data
        .models
        .iter()
        .map(|model| {
            let mut used = [false; PALETTE_LEN];
            for v in &model.voxels {
                used[v.i as usize] = true;
            }
            ModelSummary {
                size: [model.size.x, model.size.y, model.size.z],
                voxel_count: model.voxels.len(),
                colors_used: used.iter().filter(|&&u| u).count(),
            }
        })
        .collect();

    VoxSummary {
        version: data.version,
        models,
        palette_len: data.palette.len(),
    }
}
