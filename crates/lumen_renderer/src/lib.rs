//! Lumen renderer: CPU ray tracing over triangle scenes.
//!
//! - [`BvhNode`]: bounding volume hierarchy built by a surface-area sweep
//! - [`Integrator`]: recursive radiance with point lights, Phong highlights
//!   and hemisphere-sampled indirect bounces
//! - [`render`]: band-parallel dispatcher writing into an [`ImageBuffer`]

mod band;
mod bvh;
mod camera;
mod renderer;
mod scene;

pub use band::{
    generate_bands, hardware_concurrency, render, render_pixel, render_with_progress, Band,
    RenderError, RenderProgress, RenderResult, RenderStats, PROGRESS_GRANULARITY,
};
pub use bvh::{BvhError, BvhHit, BvhNode, Traversal};
pub use camera::Camera;
pub use renderer::{sample_hemisphere, Integrator, RayBudget, RenderConfig, SURFACE_EPSILON};
pub use scene::{Intersection, Scene, SceneError, SceneResult};

pub use lumen_core::{Color, ImageBuffer};
/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Vec3};

use rand::{Rng, RngCore};

/// Uniform sample in `[0, 1)`.
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
