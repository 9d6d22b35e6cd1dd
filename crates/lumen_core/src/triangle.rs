//! Triangle primitive.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::material::MaterialId;

/// Padding applied to each side of a triangle's bounding box so that flat,
/// axis-aligned triangles still have volume for the slab test.
const BOUNDS_PADDING: f32 = 0.0001;

/// Barycentric coordinates and distance of a ray-triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Parameter t along the ray
    pub distance: f32,
    /// Weight of `v1`
    pub u: f32,
    /// Weight of `v2`
    pub v: f32,
}

/// A triangle with per-vertex texture coordinates.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Texture coordinates, one per vertex
    uvs: [Vec2; 3],
    /// Pre-computed face normal (unit length, right-handed winding)
    normal: Vec3,
    material: MaterialId,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    ///
    /// Texture coordinates default to `(0,0)`, `(1,0)`, `(0,1)` so that the
    /// interpolated UV equals the barycentric hit coordinates.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: MaterialId) -> Self {
        Self::with_uvs(v0, v1, v2, [Vec2::ZERO, Vec2::X, Vec2::Y], material)
    }

    /// Create a triangle with explicit per-vertex texture coordinates.
    pub fn with_uvs(v0: Vec3, v1: Vec3, v2: Vec3, uvs: [Vec2; 3], material: MaterialId) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();

        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        let bbox = Aabb::new(
            min - Vec3::splat(BOUNDS_PADDING),
            max + Vec3::splat(BOUNDS_PADDING),
        );

        Self {
            v0,
            v1,
            v2,
            uvs,
            normal,
            material,
            bbox,
        }
    }

    /// Unit geometric normal. Zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Interpolate the texture coordinates at barycentric `(u, v)`.
    pub fn uv_at(&self, u: f32, v: f32) -> Vec2 {
        self.uvs[0] * (1.0 - u - v) + self.uvs[1] * u + self.uvs[2] * v
    }

    /// Möller-Trumbore ray-triangle intersection, restricted to `ray_t`.
    ///
    /// Both faces are hittable.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        Some(TriangleHit { distance: t, u, v })
    }
}
