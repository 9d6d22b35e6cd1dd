//! Pinhole camera for primary ray generation.

use lumen_core::CameraConfig;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

use crate::gen_f32;

/// Pinhole camera with an orthonormal basis.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    /// tan(fov / 2)
    tan_half_fov: f32,
    aspect: f32,
}

impl Camera {
    /// Build the camera basis from a configuration.
    ///
    /// World up is `+Y`; when looking straight along Y it falls back to `+Z`.
    pub fn new(config: &CameraConfig, image_width: u32, image_height: u32) -> Self {
        let forward = config.direction.normalize_or_zero();
        let forward = if forward == Vec3::ZERO { Vec3::Z } else { forward };

        let world_up = if forward.cross(Vec3::Y).length_squared() < 1e-12 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = forward.cross(world_up).normalize();
        let up = right.cross(forward);

        Self {
            image_width,
            image_height,
            position: config.position,
            forward,
            right,
            up,
            tan_half_fov: config.half_fov().tan(),
            aspect: image_width as f32 / image_height.max(1) as f32,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// `(right, up, forward)`
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.right, self.up, self.forward)
    }

    /// Ray through continuous film coordinates, in pixels from the top-left
    /// corner. `(i + 0.5, j + 0.5)` is the centre of pixel `(i, j)`.
    ///
    /// The field of view spans the image height.
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let sx = (2.0 * x / self.image_width as f32 - 1.0) * self.tan_half_fov * self.aspect;
        let sy = (1.0 - 2.0 * y / self.image_height as f32) * self.tan_half_fov;

        let direction = (self.forward + self.right * sx + self.up * sy).normalize();
        Ray::new(self.position, direction)
    }

    /// Generate a ray for pixel (i, j) jittered uniformly within the pixel.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        self.ray_through(i as f32 + gen_f32(rng), j as f32 + gen_f32(rng))
    }
}
