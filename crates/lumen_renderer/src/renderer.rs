//! Radiance integrator.
//!
//! Combines, at every hit:
//! - emission (`emissivity * color`)
//! - shadow-tested direct light from every point light, with a Phong highlight
//! - Monte Carlo indirect light from `indirect_samples` uniform hemisphere
//!   directions, each traced recursively
//!
//! All three use the triangle's geometric normal as wound: light arriving
//! from behind a face adds nothing, and bounces leave on the front side.
//!
//! Every bounce fans out by the full `indirect_samples`, so the cost of one
//! primary sample grows as `indirect_samples ^ max_depth`. This is the
//! intended cost model. The only guard is [`RayBudget`], a hard cap on the
//! number of rays a single primary sample may trace.

use std::f32::consts::PI;

use lumen_core::Color;
use lumen_math::{reflect, Ray, Vec3};
use rand::RngCore;

use crate::bvh::Traversal;
use crate::gen_f32;
use crate::scene::Scene;

/// Offset along the surface normal for secondary ray origins.
pub const SURFACE_EPSILON: f32 = 1e-3;

const PHONG_EXPONENT: i32 = 32;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Jittered camera samples averaged per pixel
    pub pixel_samples: u32,
    /// Hemisphere directions traced at every bounce
    pub indirect_samples: u32,
    /// Deepest bounce that still shades; deeper calls return black
    pub max_depth: u32,
    /// Hard cap on rays traced for one camera sample (camera, shadow and bounce rays)
    pub max_rays_per_sample: u64,
    /// BVH walk used for every query
    pub traversal: Traversal,
    /// Number of row bands; `None` uses the hardware concurrency
    pub band_count: Option<usize>,
    /// Base seed for the per-band generators; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_samples: 4,
            indirect_samples: 8,
            max_depth: 5,
            max_rays_per_sample: 1 << 20,
            traversal: Traversal::Exhaustive,
            band_count: None,
            seed: None,
        }
    }
}

/// Countdown of rays one camera sample may still trace.
#[derive(Debug, Clone)]
pub struct RayBudget {
    remaining: u64,
    exhausted: bool,
}

impl RayBudget {
    pub fn new(max_rays: u64) -> Self {
        Self {
            remaining: max_rays,
            exhausted: false,
        }
    }

    /// Claim one ray. Returns false, and remembers it, once the budget is spent.
    #[inline]
    pub fn take(&mut self) -> bool {
        if self.remaining == 0 {
            self.exhausted = true;
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// True if any ray was refused.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

/// Recursive radiance estimator over a committed scene.
pub struct Integrator<'a> {
    scene: &'a Scene,
    config: &'a RenderConfig,
}

impl<'a> Integrator<'a> {
    pub fn new(scene: &'a Scene, config: &'a RenderConfig) -> Self {
        Self { scene, config }
    }

    /// Light arriving at `origin` from `direction`.
    ///
    /// Returns black past `max_depth`, on a miss, or once `budget` is spent.
    pub fn radiance(
        &self,
        origin: Vec3,
        direction: Vec3,
        rng: &mut dyn RngCore,
        depth: u32,
        budget: &mut RayBudget,
    ) -> Color {
        if depth > self.config.max_depth || !budget.take() {
            return Color::ZERO;
        }

        let ray = Ray::new(origin, direction);
        let Some(hit) = self
            .scene
            .intersect_with(self.config.traversal, &ray, 0.0, f32::INFINITY)
        else {
            return Color::ZERO;
        };

        let triangle = hit.triangle;
        let material = self.scene.material(triangle.material());
        let color = material.color(triangle.uv_at(hit.u, hit.v));

        // Geometric normal as wound; back faces get no direct light
        let normal = triangle.normal();
        let surface = ray.at(hit.distance) + normal * SURFACE_EPSILON;

        let emitted = color * material.emissivity;
        let direct = self.direct(surface, normal, direction, color, material.reflectivity, budget);

        let mut indirect = Color::ZERO;
        if depth < self.config.max_depth && self.config.indirect_samples > 0 {
            for _ in 0..self.config.indirect_samples {
                let bounce = sample_hemisphere(normal, rng);
                indirect += self.radiance(surface, bounce, rng, depth + 1, budget);
            }
            indirect /= self.config.indirect_samples as f32;
        }

        emitted + direct + indirect * color
    }

    /// Shadow-tested light from every point light at `surface`.
    fn direct(
        &self,
        surface: Vec3,
        normal: Vec3,
        direction: Vec3,
        color: Color,
        reflectivity: f32,
        budget: &mut RayBudget,
    ) -> Color {
        let mut total = Color::ZERO;

        for light in self.scene.lights() {
            let to_light = light.position - surface;
            let distance = to_light.length();
            if distance <= 0.0 {
                continue;
            }
            let light_dir = to_light / distance;

            // A refused shadow ray counts as occluded
            if !budget.take() {
                continue;
            }
            let shadow = Ray::new(surface, light_dir);
            if self
                .scene
                .intersect_with(self.config.traversal, &shadow, 0.0, distance)
                .is_some()
            {
                continue;
            }

            let diffuse = color * normal.dot(light_dir).max(0.0);
            // Phong lobe measured against the incoming ray direction
            let highlight = reflect(-light_dir, normal)
                .dot(direction)
                .max(0.0)
                .powi(PHONG_EXPONENT);
            total += light.color * (diffuse + Color::splat(highlight * reflectivity));
        }

        total
    }
}

/// Uniform direction on the hemisphere around `normal`.
///
/// A uniform sphere sample (`theta = 2πu`, `phi = acos(2v - 1)`) mirrored
/// into the normal's hemisphere.
pub fn sample_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let theta = 2.0 * PI * gen_f32(rng);
    let phi = (2.0 * gen_f32(rng) - 1.0).acos();

    let d = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
    if d.dot(normal) < 0.0 {
        -d
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Material, Mesh, PointLight};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RED: Color = Color::new(0.8, 0.2, 0.1);

    /// 2x2 quad in the z = `z` plane facing -Z, towards the origin.
    /// Off-centre so the Z axis does not run along its diagonal.
    fn facing_quad(z: f32) -> Mesh {
        Mesh::quad(Vec3::new(1.5, -1.0, z), Vec3::new(-2.0, 0.0, 0.0), Vec3::Y * 2.0)
    }

    /// 2x2 quad in the z = `z` plane with its normal along +Z, away from the origin.
    fn back_facing_quad(z: f32) -> Mesh {
        Mesh::quad(Vec3::new(-0.5, -1.0, z), Vec3::X * 2.0, Vec3::Y * 2.0)
    }

    fn scene_with(material: Material, lights: &[PointLight]) -> Scene {
        scene_with_mesh(facing_quad(5.0), material, lights)
    }

    fn scene_with_mesh(mesh: Mesh, material: Material, lights: &[PointLight]) -> Scene {
        let mut scene = Scene::new();
        let id = scene.add_material(material);
        scene.add_mesh(&mesh, id);
        for light in lights {
            scene.add_light(*light);
        }
        scene.commit().unwrap();
        scene
    }

    fn trace(scene: &Scene, config: &RenderConfig, seed: u64) -> (Color, RayBudget) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut budget = RayBudget::new(config.max_rays_per_sample);
        let integrator = Integrator::new(scene, config);
        let color = integrator.radiance(Vec3::ZERO, Vec3::Z, &mut rng, 0, &mut budget);
        (color, budget)
    }

    #[test]
    fn test_past_max_depth_is_black() {
        let scene = scene_with(Material::diffuse(RED).with_emissivity(1.0), &[]);
        let config = RenderConfig {
            max_depth: 2,
            ..Default::default()
        };
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut budget = RayBudget::new(100);

        let color = integrator.radiance(Vec3::ZERO, Vec3::Z, &mut rng, 3, &mut budget);
        assert_eq!(color, Color::ZERO);
        // Terminated before tracing anything
        assert_eq!(budget.remaining(), 100);
    }

    #[test]
    fn test_miss_is_black() {
        let scene = scene_with(Material::diffuse(RED).with_emissivity(1.0), &[]);
        let config = RenderConfig::default();
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut budget = RayBudget::new(100);

        let color = integrator.radiance(Vec3::ZERO, -Vec3::Z, &mut rng, 0, &mut budget);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_emissive_without_lights() {
        let scene = scene_with(Material::diffuse(RED).with_emissivity(2.0), &[]);
        let config = RenderConfig {
            max_depth: 2,
            indirect_samples: 4,
            ..Default::default()
        };

        // Bounces leave the lone quad and escape, so indirect is zero too
        let (color, _) = trace(&scene, &config, 7);
        assert_eq!(color, RED * 2.0);
    }

    #[test]
    fn test_direct_light_adds_diffuse_term() {
        let light = PointLight::new(Vec3::new(0.0, 0.0, 0.0), Color::ONE);
        let scene = scene_with(Material::diffuse(RED), &[light]);
        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };

        // Light sits on the camera: n·l is ~1 at the centre of the quad
        let (color, _) = trace(&scene, &config, 1);
        assert!((color - RED).length() < 1e-3, "got {color:?}");
    }

    #[test]
    fn test_occluded_light_contributes_nothing() {
        let light = PointLight::new(Vec3::new(0.0, 0.0, 0.0), Color::ONE);
        let mut scene = Scene::new();
        let id = scene.add_material(Material::diffuse(RED));
        scene.add_mesh(&facing_quad(5.0), id);
        // Blocker between the far quad and the light, hit only by the shadow ray
        scene.add_triangle(lumen_core::Triangle::new(
            Vec3::new(-3.0, -3.0, 2.0),
            Vec3::new(3.0, -3.0, 2.0),
            Vec3::new(0.0, 3.0, 2.0),
            id,
        ));
        scene.add_light(light);
        scene.commit().unwrap();

        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut budget = RayBudget::new(100);

        // Start past the blocker so the camera ray reaches the far quad
        let color =
            integrator.radiance(Vec3::new(0.0, 0.0, 3.0), Vec3::Z, &mut rng, 0, &mut budget);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_no_highlight_when_mirror_opposes_ray() {
        let light = PointLight::new(Vec3::ZERO, Color::ONE);
        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };

        let matte = scene_with(Material::diffuse(RED), &[light]);
        let shiny = scene_with(Material::diffuse(RED).with_reflectivity(0.5), &[light]);

        let (matte_color, _) = trace(&matte, &config, 3);
        let (shiny_color, _) = trace(&shiny, &config, 3);

        // reflect(-l, n) is -Z, the ray travels +Z: the lobe is clamped to zero
        assert_eq!(shiny_color, matte_color);
    }

    #[test]
    fn test_highlight_along_ray_direction() {
        // Light beyond the quad on its normal side; the mirror direction is +Z
        let light = PointLight::new(Vec3::new(0.0, 0.0, 10.0), Color::ONE);
        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };

        let matte = scene_with_mesh(back_facing_quad(5.0), Material::diffuse(RED), &[light]);
        let shiny = scene_with_mesh(
            back_facing_quad(5.0),
            Material::diffuse(RED).with_reflectivity(0.5),
            &[light],
        );

        let (matte_color, _) = trace(&matte, &config, 3);
        let (shiny_color, _) = trace(&shiny, &config, 3);

        assert!((matte_color - RED).length() < 1e-3, "got {matte_color:?}");
        let highlight = shiny_color - matte_color;
        assert!((highlight - Color::splat(0.5)).length() < 1e-3, "got {highlight:?}");
    }

    #[test]
    fn test_back_face_is_unlit() {
        // Light and camera both behind the face
        let light = PointLight::new(Vec3::ZERO, Color::ONE);
        let scene = scene_with_mesh(back_facing_quad(5.0), Material::diffuse(RED), &[light]);
        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };

        let (color, _) = trace(&scene, &config, 1);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_bounces_leave_on_the_normal_side() {
        let mut scene = Scene::new();
        let wall = scene.add_material(Material::diffuse(Color::ONE));
        let lamp = scene.add_material(Material::diffuse(Color::ONE).with_emissivity(1.0));

        // Same emitter as below, but the receiver's normal points away from it
        scene.add_mesh(&back_facing_quad(5.0), wall);
        scene.add_mesh(
            &Mesh::quad(Vec3::new(-50.0, -50.0, -1.0), Vec3::X * 100.0, Vec3::Y * 100.0),
            lamp,
        );
        scene.commit().unwrap();

        let config = RenderConfig {
            max_depth: 1,
            indirect_samples: 64,
            ..Default::default()
        };
        let (color, _) = trace(&scene, &config, 11);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_indirect_picks_up_emitter() {
        let mut scene = Scene::new();
        let wall = scene.add_material(Material::diffuse(Color::ONE));
        let lamp = scene.add_material(Material::diffuse(Color::ONE).with_emissivity(1.0));

        // Receiver at z = 5 facing the camera; huge emitter behind the camera facing it
        scene.add_mesh(&facing_quad(5.0), wall);
        scene.add_mesh(
            &Mesh::quad(Vec3::new(-50.0, -50.0, -1.0), Vec3::X * 100.0, Vec3::Y * 100.0),
            lamp,
        );
        scene.commit().unwrap();

        let config = RenderConfig {
            max_depth: 1,
            indirect_samples: 64,
            ..Default::default()
        };
        let (color, _) = trace(&scene, &config, 11);

        // Emitter fills most of the receiver's hemisphere
        assert!(color.x > 0.5 && color.x <= 1.0, "got {color:?}");
    }

    #[test]
    fn test_ray_budget_caps_fan_out() {
        let light = PointLight::new(Vec3::ZERO, Color::ONE);
        let scene = scene_with(Material::diffuse(RED).with_emissivity(1.0), &[light]);
        let config = RenderConfig {
            max_depth: 3,
            indirect_samples: 4,
            max_rays_per_sample: 1,
            ..Default::default()
        };

        // Only the camera ray is traced: emission survives, the light does not
        let (color, budget) = trace(&scene, &config, 5);
        assert_eq!(color, RED);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_budget_not_exhausted_under_cap() {
        let scene = scene_with(Material::diffuse(RED), &[]);
        let config = RenderConfig {
            max_depth: 2,
            indirect_samples: 3,
            ..Default::default()
        };

        let (_, budget) = trace(&scene, &config, 5);
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn test_hemisphere_samples() {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();

        let mut mean = Vec3::ZERO;
        for _ in 0..2000 {
            let d = sample_hemisphere(normal, &mut rng);
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.dot(normal) >= 0.0);
            mean += d;
        }

        // Uniform hemisphere: mean cosine is 1/2
        let mean_cos = (mean / 2000.0).dot(normal);
        assert!((mean_cos - 0.5).abs() < 0.05, "mean cosine {mean_cos}");
    }
}
