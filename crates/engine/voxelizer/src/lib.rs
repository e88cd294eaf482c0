//! Surface voxelizer for textured triangle meshes
//!
//! This crate turns a closed, triangulated, world-space mesh into a dense
//! cubic voxel grid whose occupied cells index into a palette of at most 254
//! colors, the layout MagicaVoxel `.vox` files use.
//!
//! # Features
//!
//! - **Surface shells**: only cells the surface passes through are filled
//! - **Textured materials**: per-triangle UVs, lazily decoded textures
//! - **Adaptive palette**: similar colors merge under a threshold that grows
//!   with the palette
//! - **Parallel**: color resolution runs on rayon, output is deterministic
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use voxelizer::prelude::*;
//!
//! let mesh = Mesh::new(
//!     vec![Vec3::ZERO, Vec3::X, Vec3::Y],
//!     vec![Triangle::new([0, 1, 2], Some(0))],
//! );
//! let materials = MaterialTable::from(vec![Material::flat(1.0, 0.0, 0.0, 1.0)]);
//!
//! let volume = rasterize(&mesh, &materials, &NoTextures, &VoxelizeConfig::new(8))?;
//! assert_eq!(volume.palette(), &[Color::rgb(255, 0, 0)]);
//! # Ok::<(), voxelizer::VoxelizeError>(())
//! ```
//!
//! # Feature flags
//!
//! - `image`: [`ImageTextureSource`](texture::ImageTextureSource), which
//!   decodes texture files with the `image` crate

pub mod bvh;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod material;
pub mod mesh;
pub mod palette;
pub mod rasterize;
pub mod texture;
pub mod volume;

pub use bvh::{RayHit, SurfaceHit, TriangleBvh};
pub use color::{barycentric_transform, Color, ColorResolver, Rgba};
pub use config::{PalettePolicy, RasterPolicy, SizingMode, Threads, VoxelizeConfig};
pub use error::{Result, TextureError, VoxelizeError};
pub use grid::{grid_to_world_index, world_to_grid_index, VoxelGrid};
pub use material::{Material, MaterialTable};
pub use mesh::{Aabb, Mesh, Triangle};
pub use palette::{default_preset, nearest_color_index, similarity_threshold, Palette};
pub use rasterize::{rasterize, rasterize_with_progress, Lattice};
pub use texture::{InMemoryTextures, NoTextures, Texture, TextureCache, TextureId, TextureSource};
pub use volume::{RasterStats, VoxelVolume};

#[cfg(feature = "image")]
pub use texture::ImageTextureSource;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::color::{Color, Rgba};
    pub use crate::config::{SizingMode, Threads, VoxelizeConfig};
    pub use crate::error::{TextureError, VoxelizeError};
    pub use crate::material::{Material, MaterialTable};
    pub use crate::mesh::{Mesh, Triangle};
    pub use crate::rasterize::{rasterize, rasterize_with_progress};
    pub use crate::texture::{InMemoryTextures, NoTextures, Texture, TextureId, TextureSource};
    pub use crate::volume::{RasterStats, VoxelVolume};
}
