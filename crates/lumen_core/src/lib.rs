//! Lumen Core - scene data for the Lumen ray tracer.
//!
//! This crate provides the plain data the renderer consumes:
//!
//! - **Geometry**: `Triangle`, `Mesh`
//! - **Shading inputs**: `Material`, `Texture`, `PointLight`
//! - **Framing**: `CameraConfig` (three-line text format)
//! - **Output**: `ImageBuffer` with PPM/PNG export
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{CameraConfig, ImageBuffer};
//!
//! let camera = CameraConfig::load("camera.txt")?;
//! let image = ImageBuffer::new(320, 240);
//! image.save("render.ppm")?;
//! ```

pub mod camera;
pub mod image;
pub mod light;
pub mod material;
pub mod mesh;
pub mod triangle;

// Re-export commonly used types
pub use camera::{CameraConfig, CameraConfigError, CameraConfigResult};
pub use self::image::{color_to_rgb8, ImageBuffer, ImageError, ImageResult};
pub use light::PointLight;
pub use material::{Color, Material, MaterialId, Texture};
pub use mesh::Mesh;
pub use triangle::{Triangle, TriangleHit};
