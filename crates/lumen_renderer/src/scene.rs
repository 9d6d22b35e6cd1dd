//! Scene container: triangles, materials, lights, and the BVH over them.

use lumen_core::{Material, MaterialId, Mesh, PointLight, Triangle};
use lumen_math::{Aabb, Interval, Ray};
use thiserror::Error;

use crate::bvh::{BvhError, BvhNode, Traversal};

/// Errors that can occur while preparing a scene for rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("BVH build failed: {0}")]
    Bvh(#[from] BvhError),

    #[error("Triangle {triangle} references unknown material {}", .material.0)]
    UnknownMaterial {
        triangle: usize,
        material: MaterialId,
    },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A ray-scene hit.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    pub triangle: &'a Triangle,
    /// Parameter t along the query ray
    pub distance: f32,
    /// Barycentric coordinates of the hit on `triangle`
    pub u: f32,
    pub v: f32,
}

/// Static triangle scene.
///
/// Geometry is added freely, then [`Scene::commit`] validates it and builds
/// the BVH. Adding triangles afterwards drops the BVH until the next commit.
#[derive(Debug, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    lights: Vec<PointLight>,
    bvh: Option<BvhNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its id.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
        self.bvh = None;
    }

    /// Add every face of `mesh` with a single material.
    pub fn add_mesh(&mut self, mesh: &Mesh, material: MaterialId) {
        self.triangles.extend(mesh.triangles(material));
        self.bvh = None;
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Validate material references and build the BVH.
    pub fn commit(&mut self) -> SceneResult<()> {
        if let Some((triangle, t)) = self
            .triangles
            .iter()
            .enumerate()
            .find(|(_, t)| t.material().0 >= self.materials.len())
        {
            return Err(SceneError::UnknownMaterial {
                triangle,
                material: t.material(),
            });
        }

        self.bvh = Some(BvhNode::new(&self.triangles)?);

        log::info!(
            "Scene committed: {} triangles, {} materials, {} lights",
            self.triangles.len(),
            self.materials.len(),
            self.lights.len()
        );
        Ok(())
    }

    /// True once [`Scene::commit`] succeeded and no geometry changed since.
    pub fn is_committed(&self) -> bool {
        self.bvh.is_some()
    }

    /// Nearest hit with `t_min <= t <= t_max`, walking both BVH children.
    ///
    /// An uncommitted scene has nothing to hit.
    pub fn intersect(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Intersection<'_>> {
        self.intersect_with(Traversal::Exhaustive, ray, t_min, t_max)
    }

    pub fn intersect_with(
        &self,
        traversal: Traversal,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Intersection<'_>> {
        let bvh = self.bvh.as_ref()?;
        let hit = bvh.intersect_with(traversal, &self.triangles, ray, Interval::new(t_min, t_max))?;

        Some(Intersection {
            triangle: &self.triangles[hit.triangle],
            distance: hit.distance,
            u: hit.u,
            v: hit.v,
        })
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Material lookup. Ids are validated by [`Scene::commit`].
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn bvh(&self) -> Option<&BvhNode> {
        self.bvh.as_ref()
    }

    /// Bounds of all geometry, if committed.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bvh.as_ref().map(BvhNode::bounding_box)
    }
}
