//! Error types for the voxelizer
//!
//! Only precondition failures are errors. Everything that can go wrong for a
//! single lattice cell (no surface nearby, hit outside the cell, transparent
//! texel, full palette) is recovered locally and counted in
//! [`RasterStats`](crate::volume::RasterStats) instead.

use thiserror::Error;

/// Voxelization error types
#[derive(Debug, Error)]
pub enum VoxelizeError {
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Voxel detail {0} is outside 1..=256")]
    InvalidDetail(u32),

    #[error("Voxel unit scale {0} is outside [0.01, 256.0]")]
    InvalidUnitScale(f32),

    #[error("Triangle {triangle} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    InvalidTriangle {
        triangle: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Texture decoding and lookup errors
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Texture not found: {0}")]
    NotFound(String),

    #[error("Texture {name} has invalid size {width}x{height}")]
    InvalidSize {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("Texture {name} expects {expected} pixels, got {actual}")]
    PixelCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for voxelizer operations that may fail
pub type Result<T> = std::result::Result<T, VoxelizeError>;
