use lumen_math::Vec3;

use crate::Color;

/// An infinitesimal light source used for shadow-tested direct lighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }
}
