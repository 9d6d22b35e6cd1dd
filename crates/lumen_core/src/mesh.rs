//! Indexed triangle meshes.
//!
//! A mesh is a convenience for authoring scenes; the renderer only ever sees
//! the flat list of [`Triangle`]s a mesh expands into.

use lumen_math::{Aabb, Vec2, Vec3};

use crate::material::MaterialId;
use crate::triangle::Triangle;

/// A mesh consisting of vertex positions, optional UVs, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// UV coordinates (optional - one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle, counter-clockwise)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box of the positions
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Self::compute_bounds(&positions);
        Self {
            positions,
            uvs: None,
            indices,
            bounds,
        }
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(positions: Vec<Vec3>, indices: Vec<u32>, uvs: Vec<Vec2>) -> Self {
        let mut mesh = Self::new(positions, indices);
        mesh.uvs = Some(uvs);
        mesh
    }

    /// A planar quad spanning `corner`, `corner + u`, `corner + u + v`, `corner + v`.
    ///
    /// The front face normal is `u × v`. UVs run from 0 to 1 along each edge.
    pub fn quad(corner: Vec3, u: Vec3, v: Vec3) -> Self {
        Self::new_with_uvs(
            vec![corner, corner + u, corner + u + v, corner + v],
            vec![0, 1, 2, 0, 2, 3],
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
        )
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        positions
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::union(&acc, &Aabb::new(*p, *p)))
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Expand the mesh into triangles sharing one material.
    ///
    /// Faces referencing out-of-range vertices are skipped with a warning.
    pub fn triangles(&self, material: MaterialId) -> Vec<Triangle> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            let n = self.positions.len();
            if i0 >= n || i1 >= n || i2 >= n {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    n
                );
                continue;
            }

            let (p0, p1, p2) = (self.positions[i0], self.positions[i1], self.positions[i2]);
            let triangle = match &self.uvs {
                Some(uvs) if uvs.len() == n => {
                    Triangle::with_uvs(p0, p1, p2, [uvs[i0], uvs[i1], uvs[i2]], material)
                }
                _ => Triangle::new(p0, p1, p2, material),
            };
            triangles.push(triangle);
        }

        triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::new(positions, vec![0, 1, 2]);

        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.uvs.is_none());
    }

    #[test]
    fn test_bounds_computation() {
        let positions = vec![
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let mesh = Mesh::new(positions, vec![0, 1, 2]);

        assert_eq!(mesh.bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_quad_triangles() {
        let quad = Mesh::quad(Vec3::ZERO, Vec3::X * 2.0, Vec3::Y * 2.0);
        let triangles = quad.triangles(MaterialId(3));

        assert_eq!(triangles.len(), 2);
        for tri in &triangles {
            assert_eq!(tri.material(), MaterialId(3));
            assert!((tri.normal() - Vec3::Z).length() < 1e-6);
        }
        // Far corner carries UV (1, 1)
        assert_eq!(triangles[0].uv_at(0.0, 1.0), Vec2::ONE);
    }

    #[test]
    fn test_invalid_indices_are_skipped() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mesh = Mesh::new(positions, vec![0, 1, 2, 0, 1, 9]);

        assert_eq!(mesh.triangles(MaterialId::default()).len(), 1);
    }
}
