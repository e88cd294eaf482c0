//! Texture storage, sampling and the per-run decode cache
//!
//! A [`TextureSource`] knows how to produce pixels for a [`TextureId`]. The
//! [`TextureCache`] sits in front of it for the duration of one
//! voxelization run: each texture is stored once, on first use, and the
//! cache is dropped when the run ends.

use crate::color::Rgba;
use crate::error::TextureError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use glam::Vec2;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a texture (typically its file name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(String);

impl TextureId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextureId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TextureId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded RGBA texture
///
/// Pixels are row-major with channels in `[0, 1]`. Row 0 is the `v = 0`
/// edge of UV space (bottom row of the image).
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Texture {
    pub fn new(
        name: &str,
        width: u32,
        height: u32,
        pixels: Vec<[f32; 4]>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidSize {
                name: name.to_string(),
                width,
                height,
            });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::PixelCount {
                name: name.to_string(),
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from 8-bit RGBA bytes laid out bottom row first
    pub fn from_rgba8(
        name: &str,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<Self, TextureError> {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self::new(name, width, height, pixels)
    }

    /// Single-color texture
    pub fn solid(color: Rgba) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color.to_array()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).map(|p| Rgba::from_array(*p))
    }

    /// Nearest-texel lookup with tiling
    ///
    /// UVs are wrapped into `[0, 1)`, scaled by `(width - 1, height - 1)` and
    /// rounded to the nearest texel.
    pub fn sample(&self, uv: Vec2) -> Rgba {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);

        let x = texel_coord(u, self.width);
        let y = texel_coord(v, self.height);

        let index = y as usize * self.width as usize + x as usize;
        Rgba::from_array(self.pixels[index])
    }
}

fn texel_coord(t: f32, size: u32) -> u32 {
    let max = size - 1;
    // rem_euclid can round a tiny negative up to exactly 1.0
    ((t * max as f32).round() as u32).min(max)
}

/// Provider of decoded textures
pub trait TextureSource: Sync {
    fn load(&self, id: &TextureId) -> Result<Texture, TextureError>;
}

/// Source for meshes that only use flat materials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextures;

impl TextureSource for NoTextures {
    fn load(&self, id: &TextureId) -> Result<Texture, TextureError> {
        Err(TextureError::NotFound(id.to_string()))
    }
}

/// Textures held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryTextures {
    textures: HashMap<TextureId, Texture>,
}

impl InMemoryTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<TextureId>, texture: Texture) {
        self.textures.insert(id.into(), texture);
    }

    pub fn with(mut self, id: impl Into<TextureId>, texture: Texture) -> Self {
        self.insert(id, texture);
        self
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureSource for InMemoryTextures {
    fn load(&self, id: &TextureId) -> Result<Texture, TextureError> {
        self.textures
            .get(id)
            .cloned()
            .ok_or_else(|| TextureError::NotFound(id.to_string()))
    }
}

/// Image files resolved relative to a root directory
#[cfg(feature = "image")]
#[derive(Debug, Clone)]
pub struct ImageTextureSource {
    root: std::path::PathBuf,
}

#[cfg(feature = "image")]
impl ImageTextureSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[cfg(feature = "image")]
impl TextureSource for ImageTextureSource {
    fn load(&self, id: &TextureId) -> Result<Texture, TextureError> {
        let path = self.root.join(id.as_str());
        if !path.is_file() {
            return Err(TextureError::NotFound(path.display().to_string()));
        }

        // Image rows run top to bottom; UV v runs bottom to top
        let image = image::open(&path)?.flipv().into_rgba32f();
        let (width, height) = image.dimensions();
        let pixels = image.pixels().map(|p| p.0).collect();
        Texture::new(id.as_str(), width, height, pixels)
    }
}

/// Lazily populated texture cache for one voxelization run
///
/// Failed loads are cached as `None` so a missing file is reported once.
pub struct TextureCache<'a> {
    source: &'a dyn TextureSource,
    entries: DashMap<TextureId, Option<Arc<Texture>>>,
}

impl<'a> TextureCache<'a> {
    pub fn new(source: &'a dyn TextureSource) -> Self {
        Self {
            source,
            entries: DashMap::new(),
        }
    }

    /// Decoded texture, loading it on first access
    ///
    /// The source decodes with no map lock held. Racing first accesses may
    /// decode twice; the first stored result wins and is returned to all.
    pub fn get(&self, id: &TextureId) -> Option<Arc<Texture>> {
        if let Some(entry) = self.entries.get(id) {
            return entry.value().clone();
        }

        let loaded = self.source.load(id);
        match self.entries.entry(id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let texture = match loaded {
                    Ok(texture) => {
                        debug!(
                            "Loaded texture {} ({}x{})",
                            id,
                            texture.width(),
                            texture.height()
                        );
                        Some(Arc::new(texture))
                    }
                    Err(e) => {
                        warn!("Texture {} unavailable, using fallback color: {}", id, e);
                        None
                    }
                };
                entry.insert(texture).value().clone()
            }
        }
    }

    /// Number of textures requested so far (including failed ones)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of textures that decoded successfully
    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.value().is_some()).count()
    }
}
