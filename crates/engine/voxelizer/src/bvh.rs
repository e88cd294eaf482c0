//! Bounding volume hierarchy over mesh triangles
//!
//! Answers the two surface queries the rasterizer needs: nearest surface
//! point within a radius, and first ray intersection. The tree is built once
//! per run and only read afterwards, so it is shared freely across threads.

use crate::mesh::{Aabb, Mesh};
use glam::Vec3;

/// Triangles per leaf
const MAX_LEAF_SIZE: usize = 4;

/// Nearest surface point found by [`TriangleBvh::closest_point`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub location: Vec3,
    /// Geometric face normal (counter-clockwise winding), zero for degenerate triangles
    pub normal: Vec3,
    pub triangle: usize,
    pub distance: f32,
}

/// First intersection found by [`TriangleBvh::ray_cast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub location: Vec3,
    pub normal: Vec3,
    pub triangle: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
struct Primitive {
    triangle: usize,
    corners: [Vec3; 3],
    normal: Vec3,
}

impl Primitive {
    fn bounds(&self) -> Aabb {
        let [a, b, c] = self.corners;
        Aabb::new(a.min(b).min(c), a.max(b).max(c))
    }

    fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.corners;
        (a + b + c) / 3.0
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: u32, count: u32 },
    Interior { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Binary BVH with median splits along the widest centroid axis
#[derive(Debug, Clone, Default)]
pub struct TriangleBvh {
    nodes: Vec<Node>,
    primitives: Vec<Primitive>,
}

impl TriangleBvh {
    /// Build the hierarchy for every triangle of `mesh`
    ///
    /// Triangles with out-of-range vertex indices are skipped; validate the
    /// mesh first to reject them instead.
    pub fn build(mesh: &Mesh) -> Self {
        let mut primitives: Vec<Primitive> = (0..mesh.triangle_count())
            .filter_map(|triangle| {
                let corners = mesh.triangle_positions(triangle)?;
                let [a, b, c] = corners;
                Some(Primitive {
                    triangle,
                    corners,
                    normal: (b - a).cross(c - a).normalize_or_zero(),
                })
            })
            .collect();

        let mut nodes = Vec::with_capacity(2 * primitives.len().div_ceil(MAX_LEAF_SIZE));
        if !primitives.is_empty() {
            let len = primitives.len();
            build_node(&mut nodes, &mut primitives, 0, len);
        }

        Self { nodes, primitives }
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Bounds of every indexed triangle
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.bounds)
    }

    /// Nearest point on any triangle within `max_distance` (inclusive)
    ///
    /// Equidistant candidates resolve to the lowest triangle index so the
    /// answer does not depend on tree layout.
    pub fn closest_point(&self, point: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        if self.nodes.is_empty() || max_distance.is_nan() || max_distance < 0.0 {
            return None;
        }

        let mut limit = max_distance * max_distance;
        let mut best: Option<(f32, Vec3, &Primitive)> = None;
        let mut stack = vec![0u32];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.bounds.distance_squared(point) > limit {
                continue;
            }

            match node.kind {
                NodeKind::Leaf { start, count } => {
                    let range = start as usize..(start + count) as usize;
                    for prim in &self.primitives[range] {
                        let [a, b, c] = prim.corners;
                        let location = closest_point_on_triangle(point, a, b, c);
                        let d2 = point.distance_squared(location);
                        let better = match best {
                            None => d2 <= limit,
                            Some((best_d2, _, current)) => {
                                d2 < best_d2 || (d2 == best_d2 && prim.triangle < current.triangle)
                            }
                        };
                        if better {
                            limit = d2;
                            best = Some((d2, location, prim));
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    let dl = self.nodes[left as usize].bounds.distance_squared(point);
                    let dr = self.nodes[right as usize].bounds.distance_squared(point);
                    // Nearer child on top of the stack
                    if dl <= dr {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best.map(|(d2, location, prim)| SurfaceHit {
            location,
            normal: prim.normal,
            triangle: prim.triangle,
            distance: d2.sqrt(),
        })
    }

    /// First triangle hit by the ray within `max_distance`
    ///
    /// Both faces are hit. `direction` need not be normalized; distances are
    /// measured in units of its length.
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        if self.nodes.is_empty() || direction == Vec3::ZERO {
            return None;
        }

        let inv_dir = direction.recip();
        let mut limit = max_distance;
        let mut best: Option<(f32, &Primitive)> = None;
        let mut stack = vec![0u32];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !ray_hits_box(&node.bounds, origin, inv_dir, limit) {
                continue;
            }

            match node.kind {
                NodeKind::Leaf { start, count } => {
                    let range = start as usize..(start + count) as usize;
                    for prim in &self.primitives[range] {
                        let Some(t) = ray_triangle(origin, direction, &prim.corners) else {
                            continue;
                        };
                        let better = match best {
                            None => t <= limit,
                            Some((best_t, current)) => {
                                t < best_t || (t == best_t && prim.triangle < current.triangle)
                            }
                        };
                        if better {
                            limit = t;
                            best = Some((t, prim));
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        best.map(|(t, prim)| RayHit {
            location: origin + direction * t,
            normal: prim.normal,
            triangle: prim.triangle,
            distance: t,
        })
    }
}

fn build_node(nodes: &mut Vec<Node>, primitives: &mut [Primitive], start: usize, end: usize) -> u32 {
    let slice = &mut primitives[start..end];
    let bounds = slice
        .iter()
        .map(Primitive::bounds)
        .fold(Aabb::EMPTY, |acc, b| acc.union(&b));

    let index = nodes.len() as u32;
    nodes.push(Node {
        bounds,
        kind: NodeKind::Leaf {
            start: start as u32,
            count: (end - start) as u32,
        },
    });

    if slice.len() <= MAX_LEAF_SIZE {
        return index;
    }

    let mut centroid_bounds = Aabb::EMPTY;
    for prim in slice.iter() {
        centroid_bounds.grow(prim.centroid());
    }
    let extent = centroid_bounds.size();
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };

    slice.sort_by(|a, b| {
        a.centroid()[axis]
            .total_cmp(&b.centroid()[axis])
            .then(a.triangle.cmp(&b.triangle))
    });

    let mid = start + slice.len() / 2;
    let left = build_node(nodes, primitives, start, mid);
    let right = build_node(nodes, primitives, mid, end);
    nodes[index as usize].kind = NodeKind::Interior { left, right };

    index
}

/// Slab test against a box, accepting entry distances up to `max_t`
fn ray_hits_box(bounds: &Aabb, origin: Vec3, inv_dir: Vec3, max_t: f32) -> bool {
    let t0 = (bounds.min - origin) * inv_dir;
    let t1 = (bounds.max - origin) * inv_dir;
    // NaN from 0 * inf lands in min/max, which ignore it
    let t_near = t0.min(t1).max_element().max(0.0);
    let t_far = t0.max(t1).min_element().min(max_t);
    t_near <= t_far
}

/// Möller–Trumbore intersection, returning the ray parameter
fn ray_triangle(origin: Vec3, direction: Vec3, corners: &[Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-8;
    let [a, b, c] = *corners;
    let edge1 = b - a;
    let edge2 = c - a;

    let pvec = direction.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Closest point on triangle `abc` to `p`
///
/// Voronoi-region walk from Ericson, *Real-Time Collision Detection* 5.1.5.
/// Handles zero-area triangles by falling through to their edges.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() <= f32::MIN_POSITIVE {
        // Collinear corners that missed every edge region
        return nearest_on_edges(p, a, b, c);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

fn nearest_on_edges(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    [(a, b), (b, c), (c, a)]
        .into_iter()
        .map(|(s, e)| closest_point_on_segment(p, s, e))
        .min_by(|x, y| p.distance_squared(*x).total_cmp(&p.distance_squared(*y)))
        .unwrap_or(a)
}

fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}
