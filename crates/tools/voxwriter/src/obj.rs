//! OBJ/MTL loading into a voxelizer mesh
//!
//! Every model in the file is joined into one world-space mesh. MTL
//! materials become flat colors (`Kd` + `d`) or texture references
//! (`map_Kd`, relative to the OBJ directory).

use crate::error::{Result, VoxWriterError};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use voxelizer::{Material, MaterialTable, Mesh, Triangle};

/// Diffuse color used when an MTL material has no `Kd`
const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

/// Up axis of the source file; the voxelizer works Z-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UpAxis {
    /// Y-up (the usual OBJ export convention)
    #[default]
    Y,
    /// Already Z-up
    Z,
}

impl UpAxis {
    /// Rotate a point into Z-up space
    pub fn to_z_up(self, p: Vec3) -> Vec3 {
        match self {
            UpAxis::Y => Vec3::new(p.x, -p.z, p.y),
            UpAxis::Z => p,
        }
    }
}

/// A loaded OBJ file ready for voxelization
#[derive(Debug, Clone)]
pub struct ObjScene {
    pub mesh: Mesh,
    pub materials: MaterialTable,
    /// Directory texture paths are resolved against
    pub texture_root: PathBuf,
    pub model_count: usize,
}

/// Load and triangulate an OBJ file
pub fn load_obj(path: &Path, up_axis: UpAxis) -> Result<ObjScene> {
    let options = tobj::LoadOptions {
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let (models, materials) =
        tobj::load_obj(path, &options).map_err(|source| VoxWriterError::ObjLoad {
            path: path.to_path_buf(),
            source,
        })?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            warn!(
                "No materials loaded for {}, using fallback color: {}",
                path.display(),
                e
            );
            Vec::new()
        }
    };

    let table = material_table(&materials);
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let base = vertices.len() as u32;

        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| up_axis.to_z_up(Vec3::new(p[0], p[1], p[2]))),
        );

        for (face, corners) in mesh.indices.chunks_exact(3).enumerate() {
            let first = face * 3;
            let uvs = [
                texcoord(mesh, first),
                texcoord(mesh, first + 1),
                texcoord(mesh, first + 2),
            ];
            triangles.push(
                Triangle::new(
                    [base + corners[0], base + corners[1], base + corners[2]],
                    mesh.material_id,
                )
                .with_uvs(uvs),
            );
        }

        debug!(
            "Model '{}': {} vertices, {} triangles",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );
    }

    if triangles.is_empty() {
        return Err(VoxWriterError::EmptyObj(path.to_path_buf()));
    }

    let texture_root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(ObjScene {
        mesh: Mesh::new(vertices, triangles),
        materials: table,
        texture_root,
        model_count: models.len(),
    })
}

/// UV of the `corner`-th index of a mesh, zero when the mesh has none
fn texcoord(mesh: &tobj::Mesh, corner: usize) -> Vec2 {
    let index = if mesh.texcoord_indices.is_empty() {
        mesh.indices.get(corner)
    } else {
        mesh.texcoord_indices.get(corner)
    };

    index
        .and_then(|&i| {
            let i = i as usize * 2;
            Some(Vec2::new(*mesh.texcoords.get(i)?, *mesh.texcoords.get(i + 1)?))
        })
        .unwrap_or(Vec2::ZERO)
}

/// Pre-resolve MTL materials
pub fn material_table(materials: &[tobj::Material]) -> MaterialTable {
    materials
        .iter()
        .map(|m| match m.diffuse_texture.as_deref().map(str::trim) {
            Some(texture) if !texture.is_empty() => Material::textured(texture),
            _ => {
                let [r, g, b] = m.diffuse.unwrap_or(DEFAULT_DIFFUSE);
                Material::flat(r, g, b, m.dissolve.unwrap_or(1.0))
            }
        })
        .collect()
}
