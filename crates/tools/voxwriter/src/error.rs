//! Error types for the OBJ to `.vox` pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxWriterError {
    #[error("Failed to load OBJ {path}: {source}")]
    ObjLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ file contains no triangles: {0}")]
    EmptyObj(PathBuf),

    #[error("Voxelization failed: {0}")]
    Voxelize(#[from] voxelizer::VoxelizeError),

    #[error("Invalid .vox model: {0}")]
    InvalidVox(String),

    #[error("Failed to parse .vox file: {0}")]
    VoxParse(String),

    #[error("Invalid settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VoxWriterError>;
