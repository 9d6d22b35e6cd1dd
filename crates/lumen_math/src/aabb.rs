use crate::{axis, Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for the scene BVH.
///
/// Defined by its lower and upper corners. Boxes built with [`Aabb::union`]
/// satisfy `min <= max` on every axis; a box taken directly from a flat
/// primitive may have zero extent along one axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from its lower and upper corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Component-wise min of mins and max of maxes.
    pub fn union(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Extent of the box along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// `2 * (dx*dy + dx*dz + dy*dz)`.
    ///
    /// Only meaningful as a relative cost between boxes of the same tree.
    pub fn surface_area(&self) -> f32 {
        let d = self.extent();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Returns true if `other` lies entirely inside this box (boundaries inclusive).
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. A zero direction component produces an infinite inverse
    /// and is left to IEEE semantics: the ray either passes through the slab
    /// for its whole length or is rejected immediately.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for n in 0..3 {
            let adinv = 1.0 / axis(r.direction, n);
            let orig = axis(r.origin, n);

            let mut t0 = (axis(self.min, n) - orig) * adinv;
            let mut t1 = (axis(self.max, n) - orig) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// An empty box; the identity element of [`Aabb::union`].
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };
}
