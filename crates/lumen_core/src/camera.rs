//! Camera configuration text format.
//!
//! Three significant lines:
//!
//! ```text
//! # eye position
//! 0 1 -5
//! # view direction (normalized on load, zero means +Z)
//! 0 0 1
//! # field of view in degrees, clamped to [10, 160]
//! 45
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::Path;

use lumen_math::Vec3;
use thiserror::Error;

pub const MIN_FOV_DEGREES: f32 = 10.0;
pub const MAX_FOV_DEGREES: f32 = 160.0;

/// Errors that can occur while reading a camera configuration.
#[derive(Error, Debug)]
pub enum CameraConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing {0} line")]
    MissingLine(&'static str),

    #[error("Line {line}: expected {expected} values, found {found}")]
    WrongArity {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
}

pub type CameraConfigResult<T> = Result<T, CameraConfigError>;

/// Where the camera sits, where it looks, and how wide it sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Unit view direction
    pub direction: Vec3,
    /// Full field of view in radians
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Z,
            fov: 60.0_f32.to_radians(),
        }
    }
}

impl CameraConfig {
    /// Build a configuration, applying the same normalisation as parsing.
    pub fn new(position: Vec3, direction: Vec3, fov_degrees: f32) -> Self {
        let direction = if direction == Vec3::ZERO {
            Vec3::Z
        } else {
            direction.normalize()
        };
        let fov = fov_degrees
            .clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES)
            .to_radians();

        Self {
            position,
            direction,
            fov,
        }
    }

    /// Half of the field of view, in radians.
    pub fn half_fov(&self) -> f32 {
        self.fov * 0.5
    }

    /// Load a configuration from a text file.
    pub fn load(path: impl AsRef<Path>) -> CameraConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the three-line text format.
    pub fn parse(text: &str) -> CameraConfigResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (n, line) = lines.next().ok_or(CameraConfigError::MissingLine("position"))?;
        let position = parse_vec3(n, line)?;

        let (n, line) = lines.next().ok_or(CameraConfigError::MissingLine("direction"))?;
        let direction = parse_vec3(n, line)?;

        let (n, line) = lines
            .next()
            .ok_or(CameraConfigError::MissingLine("field of view"))?;
        let [fov] = parse_floats::<1>(n, line)?;

        Ok(Self::new(position, direction, fov))
    }
}

fn parse_vec3(line: usize, text: &str) -> CameraConfigResult<Vec3> {
    let [x, y, z] = parse_floats::<3>(line, text)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_floats<const N: usize>(line: usize, text: &str) -> CameraConfigResult<[f32; N]> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() != N {
        return Err(CameraConfigError::WrongArity {
            line,
            expected: N,
            found: tokens.len(),
        });
    }

    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(&tokens) {
        *value = token.parse().map_err(|_| CameraConfigError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(values)
}
