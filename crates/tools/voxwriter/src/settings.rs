//! Conversion settings
//!
//! Defaults, then an optional TOML file, then command-line flags.

use crate::error::{Result, VoxWriterError};
use crate::obj::UpAxis;
use serde::{Deserialize, Serialize};
use std::path::Path;
use voxelizer::{Threads, VoxelizeConfig};

/// Settings for one OBJ to `.vox` conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Up axis of the input OBJ
    pub up_axis: UpAxis,
    /// Voxelizer parameters
    pub voxelize: VoxelizeConfig,
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub detail: Option<u32>,
    pub default_palette: bool,
    /// Switch to scene-unit sizing with this many voxels per unit
    pub unit_scale: Option<f32>,
    pub threads: Option<usize>,
    pub up_axis: Option<UpAxis>,
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| VoxWriterError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text, path)
    }

    /// Layer command-line values on top
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(detail) = overrides.detail {
            self.voxelize.detail = detail;
        }
        if overrides.default_palette {
            self.voxelize.use_default_palette = true;
        }
        if let Some(scale) = overrides.unit_scale {
            self.voxelize = self.voxelize.with_scene_units(scale);
        }
        if let Some(threads) = overrides.threads {
            let threads = match threads {
                1 => Threads::Single,
                n => Threads::Custom(n),
            };
            self.voxelize = self.voxelize.with_threads(threads);
        }
        if let Some(up_axis) = overrides.up_axis {
            self.up_axis = up_axis;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelizer::SizingMode;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.up_axis, UpAxis::Y);
        assert_eq!(settings.voxelize, VoxelizeConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let settings = Settings::from_toml(
            r#"
            up_axis = "z"

            [voxelize]
            detail = 48
            use_default_palette = true

            [voxelize.raster]
            alpha_cutoff = 0.5
            "#,
            Path::new("voxwriter.toml"),
        )
        .unwrap();

        assert_eq!(settings.up_axis, UpAxis::Z);
        assert_eq!(settings.voxelize.detail, 48);
        assert!(settings.voxelize.use_default_palette);
        assert_eq!(settings.voxelize.raster.alpha_cutoff, 0.5);
        assert_eq!(settings.voxelize.raster.surface_nudge, 0.001);
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let err = Settings::from_toml("detail = [", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::from_toml("[voxelize]\ndetail = 48\n", Path::new("s.toml"))
            .unwrap()
            .apply(&Overrides {
                detail: Some(16),
                default_palette: true,
                unit_scale: Some(4.0),
                threads: Some(1),
                up_axis: Some(UpAxis::Z),
            });

        assert_eq!(settings.voxelize.detail, 16);
        assert!(settings.voxelize.use_default_palette);
        assert_eq!(settings.voxelize.sizing, SizingMode::SceneUnits);
        assert_eq!(settings.voxelize.unit_scale, 4.0);
        assert_eq!(settings.voxelize.threads, Threads::Single);
        assert_eq!(settings.up_axis, UpAxis::Z);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let settings = Settings::from_toml("[voxelize]\ndetail = 48\n", Path::new("s.toml"))
            .unwrap()
            .apply(&Overrides::default());
        assert_eq!(settings.voxelize.detail, 48);
        assert_eq!(settings.voxelize.threads, Threads::Global);
    }
}
