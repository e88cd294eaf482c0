//! Material lookup
//!
//! Materials are resolved ahead of time into either a flat color or a
//! texture reference, so voxelization never walks a shader graph.

use crate::color::Rgba;
use crate::texture::TextureId;

/// Pre-resolved surface material
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Constant RGBA base color
    Flat(Rgba),
    /// Base color sampled from a 2D texture through the triangle UVs
    Textured(TextureId),
}

impl Material {
    pub fn flat(r: f32, g: f32, b: f32, a: f32) -> Self {
        Material::Flat(Rgba::new(r, g, b, a))
    }

    pub fn textured(id: impl Into<TextureId>) -> Self {
        Material::Textured(id.into())
    }
}

/// Used for triangles without a material or with an out-of-range index
pub static FALLBACK_MATERIAL: Material = Material::Flat(Rgba::FALLBACK_GRAY);

/// Indexed material list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material and return its index
    pub fn push(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Material for a triangle's material slot, falling back to flat gray
    pub fn resolve(&self, index: Option<usize>) -> &Material {
        index
            .and_then(|i| self.materials.get(i))
            .unwrap_or(&FALLBACK_MATERIAL)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Distinct texture references, in first-use order
    pub fn textures(&self) -> Vec<&TextureId> {
        let mut ids: Vec<&TextureId> = Vec::new();
        for material in &self.materials {
            if let Material::Textured(id) = material {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

impl From<Vec<Material>> for MaterialTable {
    fn from(materials: Vec<Material>) -> Self {
        Self { materials }
    }
}

impl FromIterator<Material> for MaterialTable {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        Self {
            materials: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bound_material() {
        let table = MaterialTable::from(vec![
            Material::flat(1.0, 0.0, 0.0, 1.0),
            Material::textured("bricks.png"),
        ]);

        assert_eq!(table.resolve(Some(0)), &Material::flat(1.0, 0.0, 0.0, 1.0));
        assert_eq!(table.resolve(Some(1)), &Material::textured("bricks.png"));
    }

    #[test]
    fn test_resolve_falls_back_to_gray() {
        let table = MaterialTable::from(vec![Material::flat(1.0, 0.0, 0.0, 1.0)]);

        assert_eq!(table.resolve(None), &FALLBACK_MATERIAL);
        assert_eq!(table.resolve(Some(5)), &FALLBACK_MATERIAL);
        assert_eq!(
            FALLBACK_MATERIAL,
            Material::Flat(Rgba::new(0.8, 0.8, 0.8, 1.0))
        );
    }

    #[test]
    fn test_push_returns_index() {
        let mut table = MaterialTable::new();
        assert!(table.is_empty());
        assert_eq!(table.push(Material::flat(0.0, 0.0, 0.0, 1.0)), 0);
        assert_eq!(table.push(Material::textured("a.png")), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_textures_deduplicated() {
        let table: MaterialTable = vec![
            Material::textured("a.png"),
            Material::flat(0.5, 0.5, 0.5, 1.0),
            Material::textured("b.png"),
            Material::textured("a.png"),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = table.textures().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a.png", "b.png"]);
    }
}
