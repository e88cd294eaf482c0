//! Surface color types and per-hit color resolution

use crate::material::{Material, MaterialTable};
use crate::mesh::Mesh;
use crate::texture::TextureCache;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Linear RGBA color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Color of surfaces with no usable material
    pub const FALLBACK_GRAY: Rgba = Rgba::new(0.8, 0.8, 0.8, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Truncating conversion to 8-bit channels, always opaque
    pub fn quantize(self) -> Color {
        Color::new(
            quantize_channel(self.r),
            quantize_channel(self.g),
            quantize_channel(self.b),
            255,
        )
    }
}

fn quantize_channel(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

/// 8-bit palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Unpack a `0xAABBGGRR` word (MagicaVoxel palette layout)
    pub const fn from_abgr(value: u32) -> Self {
        Self {
            r: (value & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: ((value >> 16) & 0xff) as u8,
            a: ((value >> 24) & 0xff) as u8,
        }
    }

    pub const fn to_abgr(self) -> u32 {
        (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }

    /// Euclidean distance over the RGB channels (alpha ignored)
    pub fn distance(&self, other: &Color) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Color) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        dr * dr + dg * dg + db * db
    }
}

/// Map a point on a triangle to its interpolated UV
///
/// The point is projected onto the triangle plane. For a zero-area triangle
/// the UV of the nearest corner is used.
pub fn barycentric_transform(point: Vec3, corners: [Vec3; 3], uvs: [Vec2; 3]) -> Vec2 {
    let [a, b, c] = corners;
    let v0 = b - a;
    let v1 = c - a;
    let v2 = point - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON * d00.max(d11).max(1.0) {
        let nearest = corners
            .iter()
            .enumerate()
            .min_by(|(_, p), (_, q)| {
                point
                    .distance_squared(**p)
                    .total_cmp(&point.distance_squared(**q))
            })
            .map_or(0, |(i, _)| i);
        return uvs[nearest];
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    uvs[0] * u + uvs[1] * v + uvs[2] * w
}

/// Looks up the surface color at a closest-point hit
pub struct ColorResolver<'a> {
    mesh: &'a Mesh,
    materials: &'a MaterialTable,
    textures: &'a TextureCache<'a>,
    surface_nudge: f32,
}

impl<'a> ColorResolver<'a> {
    pub fn new(
        mesh: &'a Mesh,
        materials: &'a MaterialTable,
        textures: &'a TextureCache<'a>,
    ) -> Self {
        Self {
            mesh,
            materials,
            textures,
            surface_nudge: 0.0,
        }
    }

    /// Push texture lookups this far below the surface along the normal
    pub fn with_surface_nudge(mut self, nudge: f32) -> Self {
        self.surface_nudge = nudge;
        self
    }

    /// Color of `triangle_id` at `hit_point`
    ///
    /// Returns `None` only for an unknown triangle. Missing materials and
    /// undecodable textures resolve to [`Rgba::FALLBACK_GRAY`].
    pub fn resolve_color(
        &self,
        hit_point: Vec3,
        hit_normal: Vec3,
        triangle_id: usize,
    ) -> Option<Rgba> {
        let triangle = self.mesh.triangle(triangle_id)?;
        let corners = self.mesh.triangle_positions(triangle_id)?;

        match self.materials.resolve(triangle.material) {
            Material::Flat(color) => Some(*color),
            Material::Textured(id) => {
                let Some(texture) = self.textures.get(id) else {
                    return Some(Rgba::FALLBACK_GRAY);
                };
                let sample_point = hit_point - hit_normal * self.surface_nudge;
                let uv = barycentric_transform(sample_point, corners, triangle.uvs);
                Some(texture.sample(uv))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Triangle;
    use crate::texture::{InMemoryTextures, NoTextures, Texture};

    #[test]
    fn test_quantize_truncates() {
        assert_eq!(Rgba::FALLBACK_GRAY.quantize(), Color::rgb(204, 204, 204));
        assert_eq!(Rgba::new(1.0, 0.0, 0.999, 0.2).quantize(), Color::rgb(255, 0, 254));
        assert_eq!(Rgba::new(1.5, -0.5, 0.5, 1.0).quantize(), Color::rgb(255, 0, 127));
    }

    #[test]
    fn test_abgr_layout() {
        let color = Color::from_abgr(0xff3366cc);
        assert_eq!(color, Color::new(0xcc, 0x66, 0x33, 0xff));
        assert_eq!(color.to_abgr(), 0xff3366cc);
    }

    #[test]
    fn test_distance_ignores_alpha() {
        let a = Color::new(0, 0, 0, 0);
        let b = Color::new(3, 4, 0, 255);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_barycentric_corners_and_center() {
        let corners = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];

        assert!(barycentric_transform(Vec3::X, corners, uvs).abs_diff_eq(uvs[1], 1e-6));
        assert!(barycentric_transform(Vec3::Y, corners, uvs).abs_diff_eq(uvs[2], 1e-6));

        let center = (corners[0] + corners[1] + corners[2]) / 3.0;
        let uv = barycentric_transform(center, corners, uvs);
        assert!(uv.abs_diff_eq(Vec2::splat(1.0 / 3.0), 1e-6));
    }

    #[test]
    fn test_barycentric_projects_off_plane_points() {
        let corners = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let on = barycentric_transform(Vec3::new(0.25, 0.25, 0.0), corners, uvs);
        let off = barycentric_transform(Vec3::new(0.25, 0.25, -0.3), corners, uvs);
        assert!(on.abs_diff_eq(off, 1e-6));
    }

    #[test]
    fn test_barycentric_degenerate_triangle() {
        let corners = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        let uvs = [Vec2::new(0.1, 0.1), Vec2::new(0.5, 0.5), Vec2::new(0.9, 0.9)];
        let uv = barycentric_transform(Vec3::new(1.9, 0.0, 0.0), corners, uvs);
        assert_eq!(uv, uvs[2]);
    }

    fn single_triangle(material: Option<usize>) -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Triangle::new([0, 1, 2], material).with_uvs([
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
            ])],
        )
    }

    #[test]
    fn test_resolve_flat_and_fallback() {
        let mesh = single_triangle(Some(0));
        let materials = MaterialTable::from(vec![Material::flat(0.2, 0.4, 0.6, 1.0)]);
        let textures = TextureCache::new(&NoTextures);
        let resolver = ColorResolver::new(&mesh, &materials, &textures);

        assert_eq!(
            resolver.resolve_color(Vec3::new(0.1, 0.1, 0.0), Vec3::Z, 0),
            Some(Rgba::new(0.2, 0.4, 0.6, 1.0))
        );
        assert_eq!(resolver.resolve_color(Vec3::ZERO, Vec3::Z, 3), None);

        let unbound = single_triangle(None);
        let resolver = ColorResolver::new(&unbound, &materials, &textures);
        assert_eq!(
            resolver.resolve_color(Vec3::ZERO, Vec3::Z, 0),
            Some(Rgba::FALLBACK_GRAY)
        );
    }

    #[test]
    fn test_resolve_textured() {
        let mesh = single_triangle(Some(0));
        let materials = MaterialTable::from(vec![Material::textured("grad")]);
        // Red along u, green along v
        let texture = Texture::new(
            "grad",
            2,
            2,
            vec![
                [0.0, 0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [1.0, 1.0, 0.0, 1.0],
            ],
        )
        .unwrap();
        let source = InMemoryTextures::new().with("grad", texture);
        let textures = TextureCache::new(&source);
        let resolver =
            ColorResolver::new(&mesh, &materials, &textures).with_surface_nudge(0.001);

        let near_x = resolver
            .resolve_color(Vec3::new(0.9, 0.05, 0.0), Vec3::Z, 0)
            .unwrap();
        assert_eq!(near_x, Rgba::new(1.0, 0.0, 0.0, 1.0));

        let near_y = resolver
            .resolve_color(Vec3::new(0.05, 0.9, 0.0), Vec3::Z, 0)
            .unwrap();
        assert_eq!(near_y, Rgba::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_texture_falls_back_to_gray() {
        let mesh = single_triangle(Some(0));
        let materials = MaterialTable::from(vec![Material::textured("missing.png")]);
        let textures = TextureCache::new(&NoTextures);
        let resolver = ColorResolver::new(&mesh, &materials, &textures);

        assert_eq!(
            resolver.resolve_color(Vec3::new(0.2, 0.2, 0.0), Vec3::Z, 0),
            Some(Rgba::FALLBACK_GRAY)
        );
        assert_eq!(textures.len(), 1);
    }
}
