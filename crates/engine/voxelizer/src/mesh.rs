//! Read-only triangle mesh view
//!
//! The mesh arrives already triangulated with every transform applied, so
//! all positions are world space. Each triangle carries its own material
//! index and per-corner UVs.

use crate::error::{Result, VoxelizeError};
use glam::{Vec2, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point will grow
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounding box of a set of points, `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut bounds = Self::EMPTY;
        let mut any = false;
        for p in points {
            bounds.grow(*p);
            any = true;
        }
        any.then_some(bounds)
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest edge length
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    /// Squared distance from `p` to the box (0 inside)
    pub fn distance_squared(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        p.distance_squared(clamped)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// A mesh triangle: three vertex indices, a material slot and three UVs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    /// Index into the material table; `None` when no material is bound
    pub material: Option<usize>,
    pub uvs: [Vec2; 3],
}

impl Triangle {
    /// Triangle without UVs
    pub fn new(indices: [u32; 3], material: Option<usize>) -> Self {
        Self {
            indices,
            material,
            uvs: [Vec2::ZERO; 3],
        }
    }

    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = uvs;
        self
    }
}

/// Triangulated, transform-baked surface mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// World-space corners of a triangle
    ///
    /// Returns `None` for an unknown triangle or out-of-range vertex index.
    pub fn triangle_positions(&self, index: usize) -> Option<[Vec3; 3]> {
        let tri = self.triangles.get(index)?;
        let [a, b, c] = tri.indices;
        Some([
            *self.vertices.get(a as usize)?,
            *self.vertices.get(b as usize)?,
            *self.vertices.get(c as usize)?,
        ])
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Check that the mesh can be voxelized
    ///
    /// Rejects empty meshes, non-finite positions, dangling vertex indices and
    /// a zero-size bounding box.
    pub fn validate(&self) -> Result<Aabb> {
        if self.vertices.is_empty() {
            return Err(VoxelizeError::DegenerateGeometry(
                "mesh has no vertices".to_string(),
            ));
        }
        if self.triangles.is_empty() {
            return Err(VoxelizeError::DegenerateGeometry(
                "mesh has no triangles".to_string(),
            ));
        }
        if let Some(i) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(VoxelizeError::DegenerateGeometry(format!(
                "vertex {} is not finite",
                i
            )));
        }

        let vertex_count = self.vertices.len();
        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&vertex) = tri.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(VoxelizeError::InvalidTriangle {
                    triangle,
                    vertex,
                    vertex_count,
                });
            }
        }

        let bounds = Aabb::from_points(&self.vertices).ok_or_else(|| {
            VoxelizeError::DegenerateGeometry("mesh has no vertices".to_string())
        })?;
        if bounds.max_extent() <= f32::EPSILON {
            return Err(VoxelizeError::DegenerateGeometry(format!(
                "bounding box has zero size at {}",
                bounds.min
            )));
        }

        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.5),
                Vec3::new(0.0, 1.0, 0.5),
            ],
            vec![
                Triangle::new([0, 1, 2], Some(0)),
                Triangle::new([0, 2, 3], None),
            ],
        )
    }

    #[test]
    fn test_bounds() {
        let bounds = quad().bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(bounds.max_extent(), 2.0);
        assert_eq!(bounds.center(), Vec3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_aabb_distance() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.distance_squared(Vec3::splat(0.5)), 0.0);
        assert_eq!(aabb.distance_squared(Vec3::new(3.0, 0.5, 0.5)), 4.0);
        assert!(aabb.contains(Vec3::ONE));
        assert!(!aabb.contains(Vec3::new(1.1, 0.0, 0.0)));
    }

    #[test]
    fn test_triangle_positions() {
        let mesh = quad();
        let [a, b, c] = mesh.triangle_positions(1).unwrap();
        assert_eq!(a, Vec3::ZERO);
        assert_eq!(b, Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(c, Vec3::new(0.0, 1.0, 0.5));
        assert!(mesh.triangle_positions(2).is_none());
    }

    #[test]
    fn test_validate_ok() {
        assert!(quad().validate().is_ok());
    }

    #[test]
    fn test_validate_empty() {
        let err = Mesh::default().validate();
        assert!(matches!(err, Err(VoxelizeError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_validate_zero_size_bounds() {
        let mesh = Mesh::new(
            vec![Vec3::ONE, Vec3::ONE, Vec3::ONE],
            vec![Triangle::new([0, 1, 2], None)],
        );
        assert!(matches!(
            mesh.validate(),
            Err(VoxelizeError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_validate_dangling_index() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Triangle::new([0, 1, 7], None)],
        );
        assert!(matches!(
            mesh.validate(),
            Err(VoxelizeError::InvalidTriangle {
                triangle: 0,
                vertex: 7,
                vertex_count: 3
            })
        ));
    }
}
