//! OBJ to MagicaVoxel `.vox` converter
//!
//! Loads a textured OBJ/MTL scene, voxelizes its surface with the
//! `voxelizer` crate and writes a single-model `.vox` file.

pub mod convert;
pub mod error;
pub mod obj;
pub mod settings;
pub mod vox;

pub use convert::{convert, ConvertReport};
pub use error::{Result, VoxWriterError};
pub use obj::{load_obj, ObjScene, UpAxis};
pub use settings::{Overrides, Settings};
pub use vox::{read_vox, save_vox, summarize, validate, vox_data, write_vox, ModelSummary, VoxSummary};
