//! Voxelization parameters
//!
//! [`VoxelizeConfig`] carries the user-facing options (detail, sizing mode,
//! default palette, threading). The empirically chosen constants of the
//! palette growth rule and of the rasterizer live in [`PalettePolicy`] and
//! [`RasterPolicy`] so they can be tuned without touching the algorithms.

use crate::error::{Result, VoxelizeError};
use serde::{Deserialize, Serialize};

/// Largest lattice side the rasterizer accepts (and the `.vox` size limit)
pub const MAX_DETAIL: u32 = 256;

/// Valid range of [`VoxelizeConfig::unit_scale`]
pub const UNIT_SCALE_RANGE: (f32, f32) = (0.01, 256.0);

/// How the voxel edge length is derived from the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// `voxel_size = max(bbox extent) / detail`; the mesh fills the lattice
    #[default]
    ObjectBounds,
    /// `voxel_size = 1 / unit_scale`; detail is derived from the mesh extent
    SceneUnits,
}

/// Thread pool used to resolve lattice slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threads {
    /// Evaluate every slice on the calling thread
    Single,
    /// Global rayon pool
    #[default]
    Global,
    /// Dedicated pool with the given number of workers
    Custom(usize),
}

/// Adaptive palette growth rule
///
/// A new color is merged into the nearest entry when it lies within
/// `clamp(len * threshold_scale, min_threshold, max_threshold)` (Euclidean
/// distance over 0-255 RGB). The defaults are empirical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalettePolicy {
    pub threshold_scale: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
    /// Palette stops growing once it holds this many entries
    pub capacity: usize,
}

impl Default for PalettePolicy {
    fn default() -> Self {
        Self {
            threshold_scale: 0.65,
            min_threshold: 7.0,
            max_threshold: 12.0,
            capacity: 254,
        }
    }
}

/// Per-cell sampling constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterPolicy {
    /// Closest-point search radius as a multiple of the voxel size (≈ √2 / 2)
    pub query_radius_factor: f32,
    /// Distance the sample point is pushed along the inward normal
    pub surface_nudge: f32,
    /// Samples with alpha below this are treated as empty
    pub alpha_cutoff: f32,
    /// An axis stops once its cell center passes `bbox_max + margin * voxel_size`
    pub early_exit_margin: f32,
    /// Slack outside the lattice's outer faces when assigning a surface point
    /// to a cell, as a fraction of the voxel size
    pub cell_tolerance: f32,
}

impl Default for RasterPolicy {
    fn default() -> Self {
        Self {
            query_radius_factor: 0.71,
            surface_nudge: 0.001,
            alpha_cutoff: 0.1,
            early_exit_margin: 1.0,
            cell_tolerance: 1e-4,
        }
    }
}

/// Configuration for mesh voxelization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelizeConfig {
    /// Lattice side length in cells (ignored in [`SizingMode::SceneUnits`])
    pub detail: u32,
    /// Seed the palette with the MagicaVoxel default preset
    pub use_default_palette: bool,
    pub sizing: SizingMode,
    /// Voxels per world unit in [`SizingMode::SceneUnits`]
    pub unit_scale: f32,
    pub threads: Threads,
    pub palette: PalettePolicy,
    pub raster: RasterPolicy,
}

impl Default for VoxelizeConfig {
    fn default() -> Self {
        Self {
            detail: 32,
            use_default_palette: false,
            sizing: SizingMode::ObjectBounds,
            unit_scale: 1.0,
            threads: Threads::Global,
            palette: PalettePolicy::default(),
            raster: RasterPolicy::default(),
        }
    }
}

impl VoxelizeConfig {
    /// Create a new voxelization configuration with specified detail
    pub fn new(detail: u32) -> Self {
        Self {
            detail,
            ..Default::default()
        }
    }

    /// Seed the palette with the default preset
    pub fn with_default_palette(mut self, enabled: bool) -> Self {
        self.use_default_palette = enabled;
        self
    }

    /// Switch to scene-unit sizing with the given voxels per world unit
    pub fn with_scene_units(mut self, unit_scale: f32) -> Self {
        self.sizing = SizingMode::SceneUnits;
        self.unit_scale = unit_scale;
        self
    }

    /// Set the sizing mode
    pub fn with_sizing(mut self, sizing: SizingMode) -> Self {
        self.sizing = sizing;
        self
    }

    /// Set the thread pool
    pub fn with_threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    /// Set the palette growth rule
    pub fn with_palette_policy(mut self, policy: PalettePolicy) -> Self {
        self.palette = policy;
        self
    }

    /// Set the per-cell sampling constants
    pub fn with_raster_policy(mut self, policy: RasterPolicy) -> Self {
        self.raster = policy;
        self
    }

    /// Check every parameter against its domain
    pub fn validate(&self) -> Result<()> {
        if self.sizing == SizingMode::ObjectBounds && !(1..=MAX_DETAIL).contains(&self.detail) {
            return Err(VoxelizeError::InvalidDetail(self.detail));
        }

        let (min_scale, max_scale) = UNIT_SCALE_RANGE;
        if !(min_scale..=max_scale).contains(&self.unit_scale) {
            return Err(VoxelizeError::InvalidUnitScale(self.unit_scale));
        }

        if self.threads == Threads::Custom(0) {
            return Err(VoxelizeError::InvalidConfig(
                "custom thread count must be at least 1".to_string(),
            ));
        }

        let palette = &self.palette;
        if !(1..=crate::palette::MAX_SLOTS).contains(&palette.capacity) {
            return Err(VoxelizeError::InvalidConfig(format!(
                "palette capacity {} is outside 1..={}",
                palette.capacity,
                crate::palette::MAX_SLOTS
            )));
        }
        if palette.min_threshold < 0.0 || palette.min_threshold > palette.max_threshold {
            return Err(VoxelizeError::InvalidConfig(format!(
                "palette thresholds must satisfy 0 <= min ({}) <= max ({})",
                palette.min_threshold, palette.max_threshold
            )));
        }

        let raster = &self.raster;
        if raster.query_radius_factor.is_nan() || raster.query_radius_factor <= 0.0 {
            return Err(VoxelizeError::InvalidConfig(format!(
                "query radius factor must be positive, got {}",
                raster.query_radius_factor
            )));
        }
        if raster.cell_tolerance < 0.0 || raster.early_exit_margin < 0.0 {
            return Err(VoxelizeError::InvalidConfig(
                "cell tolerance and early exit margin must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = VoxelizeConfig::default();
        assert_eq!(config.detail, 32);
        assert_eq!(config.sizing, SizingMode::ObjectBounds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_detail_domain() {
        assert!(VoxelizeConfig::new(1).validate().is_ok());
        assert!(VoxelizeConfig::new(256).validate().is_ok());
        assert!(matches!(
            VoxelizeConfig::new(0).validate(),
            Err(VoxelizeError::InvalidDetail(0))
        ));
        assert!(matches!(
            VoxelizeConfig::new(257).validate(),
            Err(VoxelizeError::InvalidDetail(257))
        ));
    }

    #[test]
    fn test_detail_ignored_in_scene_units() {
        let config = VoxelizeConfig::new(0).with_scene_units(2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unit_scale_domain() {
        assert!(VoxelizeConfig::default().with_scene_units(0.01).validate().is_ok());
        assert!(VoxelizeConfig::default().with_scene_units(256.0).validate().is_ok());
        assert!(matches!(
            VoxelizeConfig::default().with_scene_units(0.001).validate(),
            Err(VoxelizeError::InvalidUnitScale(_))
        ));
        assert!(matches!(
            VoxelizeConfig::default().with_scene_units(f32::NAN).validate(),
            Err(VoxelizeError::InvalidUnitScale(_))
        ));
    }

    #[test]
    fn test_zero_custom_threads_rejected() {
        let config = VoxelizeConfig::default().with_threads(Threads::Custom(0));
        assert!(matches!(
            config.validate(),
            Err(VoxelizeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_palette_capacity_bounds() {
        let policy = PalettePolicy {
            capacity: 300,
            ..Default::default()
        };
        let config = VoxelizeConfig::default().with_palette_policy(policy);
        assert!(config.validate().is_err());
    }

    // Policy, not law: these pin the empirical defaults.
    #[test]
    fn test_policy_defaults() {
        let palette = PalettePolicy::default();
        assert_eq!(palette.threshold_scale, 0.65);
        assert_eq!(palette.min_threshold, 7.0);
        assert_eq!(palette.max_threshold, 12.0);
        assert_eq!(palette.capacity, 254);

        let raster = RasterPolicy::default();
        assert_eq!(raster.query_radius_factor, 0.71);
        assert_eq!(raster.surface_nudge, 0.001);
        assert_eq!(raster.alpha_cutoff, 0.1);
        assert_eq!(raster.early_exit_margin, 1.0);
    }

    #[test]
    fn test_config_from_toml() {
        let config: VoxelizeConfig = toml::from_str(
            r#"
            detail = 64
            use_default_palette = true
            sizing = "scene_units"
            unit_scale = 4.0
            threads = { custom = 2 }

            [palette]
            max_threshold = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.detail, 64);
        assert!(config.use_default_palette);
        assert_eq!(config.sizing, SizingMode::SceneUnits);
        assert_eq!(config.threads, Threads::Custom(2));
        assert_eq!(config.palette.max_threshold, 20.0);
        assert_eq!(config.palette.min_threshold, 7.0);
        assert_eq!(config.raster, RasterPolicy::default());
    }
}
