//! Floating-point image buffer and 8-bit export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::Color;

/// Errors that can occur while exporting an image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Pixel buffer does not match a {width}x{height} image")]
    SizeMismatch { width: u32, height: u32 },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Row-major RGB image with floating-point channels.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Split the buffer into disjoint mutable runs of whole rows, one per
    /// entry of `row_counts`, taken top to bottom.
    ///
    /// Stops early if the counts ask for more rows than the image has.
    pub fn rows_mut<I>(&mut self, row_counts: I) -> Vec<&mut [Color]>
    where
        I: IntoIterator<Item = u32>,
    {
        let width = self.width as usize;
        let mut rest = self.pixels.as_mut_slice();
        let mut runs = Vec::new();

        for rows in row_counts {
            let len = rows as usize * width;
            if len > rest.len() {
                break;
            }
            let (run, tail) = std::mem::take(&mut rest).split_at_mut(len);
            runs.push(run);
            rest = tail;
        }
        runs
    }

    /// Convert to row-major RGB bytes.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*color));
        }
        bytes
    }

    /// Write a plain-text (P3) PPM.
    pub fn write_ppm<W: Write>(&self, writer: &mut W) -> ImageResult<()> {
        writeln!(writer, "P3")?;
        writeln!(writer, "{} {}", self.width, self.height)?;
        writeln!(writer, "255")?;

        for color in &self.pixels {
            let [r, g, b] = color_to_rgb8(*color);
            writeln!(writer, "{} {} {}", r, g, b)?;
        }

        Ok(())
    }

    /// Save to disk. `.ppm` is written directly, anything else goes
    /// through the `image` crate and is chosen by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            let mut writer = BufWriter::new(File::create(path)?);
            self.write_ppm(&mut writer)?;
            writer.flush()?;
        } else {
            let rgb = image::RgbImage::from_raw(self.width, self.height, self.to_rgb8()).ok_or(
                ImageError::SizeMismatch {
                    width: self.width,
                    height: self.height,
                },
            )?;
            rgb.save(path)?;
        }

        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Map one floating-point channel to 0-255.
///
/// Values above 1.0 saturate to 255; negatives and NaN become 0.
#[inline]
pub fn channel_to_u8(c: f32) -> u8 {
    if c > 1.0 {
        255
    } else if c > 0.0 {
        (c * 255.0) as u8
    } else {
        0
    }
}

/// Convert a color to 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    [
        channel_to_u8(color.x),
        channel_to_u8(color.y),
        channel_to_u8(color.z),
    ]
}
