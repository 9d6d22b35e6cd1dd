//! Surface materials for the simplified lighting model.

use lumen_math::{Vec2, Vec3};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Index of a material in a scene's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialId(pub usize);

/// Diffuse color source, possibly varying over the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Texture {
    /// Constant color
    Solid(Color),
    /// Checkerboard in UV space; `scale` squares per unit of UV.
    Checker { even: Color, odd: Color, scale: f32 },
}

impl Texture {
    /// Sample the texture at the given UV coordinates.
    pub fn sample(&self, uv: Vec2) -> Color {
        match self {
            Texture::Solid(color) => *color,
            Texture::Checker { even, odd, scale } => {
                let cell = (uv * *scale).floor();
                if (cell.x + cell.y).rem_euclid(2.0) < 0.5 {
                    *even
                } else {
                    *odd
                }
            }
        }
    }
}

/// A material definition.
///
/// The integrator scales the diffuse color by `emissivity` for the emitted
/// term and by `reflectivity` for the Phong highlight of each light.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub texture: Texture,
    pub emissivity: f32,
    pub reflectivity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            texture: Texture::Solid(Color::splat(0.5)), // Grey default
            emissivity: 0.0,
            reflectivity: 0.0,
        }
    }
}

impl Material {
    /// Create a non-emissive, matte material with a constant color.
    pub fn diffuse(color: Color) -> Self {
        Self {
            texture: Texture::Solid(color),
            ..Default::default()
        }
    }

    pub fn with_emissivity(mut self, emissivity: f32) -> Self {
        self.emissivity = emissivity;
        self
    }

    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = texture;
        self
    }

    /// Diffuse color at the given UV coordinates.
    pub fn color(&self, uv: Vec2) -> Color {
        self.texture.sample(uv)
    }
}
