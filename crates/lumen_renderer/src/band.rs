//! Band-based parallel rendering.
//!
//! Divides the image into contiguous horizontal bands, one per hardware
//! thread, and renders them concurrently with rayon. Each band owns its rows
//! of the output buffer and its own random generator; the only state shared
//! between bands is an atomic completed-pixel counter used for progress.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lumen_core::{Color, ImageBuffer};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::camera::Camera;
use crate::renderer::{Integrator, RayBudget, RenderConfig};
use crate::scene::Scene;

/// Completed pixels between progress reports.
pub const PROGRESS_GRANULARITY: u64 = 100_000;

/// Errors that abort a render before any worker starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Scene has no BVH; call Scene::commit before rendering")]
    SceneNotCommitted,

    #[error("Cannot render an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error("Camera is set up for {camera_width}x{camera_height} but the image is {image_width}x{image_height}")]
    ResolutionMismatch {
        camera_width: u32,
        camera_height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("pixel_samples must be at least 1")]
    NoPixelSamples,
}

pub type RenderResult<T> = Result<T, RenderError>;

/// A contiguous run of image rows, `[y_start, y_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub index: usize,
    pub y_start: u32,
    pub y_end: u32,
}

impl Band {
    pub fn rows(&self) -> u32 {
        self.y_end - self.y_start
    }
}

/// Split `height` rows into `count` contiguous bands.
///
/// Never produces more bands than rows. Earlier bands take one extra row
/// when the division is uneven.
pub fn generate_bands(height: u32, count: usize) -> Vec<Band> {
    let count = count.clamp(1, height.max(1) as usize) as u32;
    let base = height / count;
    let extra = height % count;

    let mut bands = Vec::with_capacity(count as usize);
    let mut y = 0;
    for index in 0..count {
        let rows = base + u32::from(index < extra);
        bands.push(Band {
            index: index as usize,
            y_start: y,
            y_end: y + rows,
        });
        y += rows;
    }
    bands
}

/// Number of hardware threads, or 1 if it cannot be determined.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Snapshot of render progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub completed: u64,
    pub total: u64,
}

impl RenderProgress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 * self.completed as f32 / self.total as f32
    }
}

/// Summary of a finished render.
#[derive(Debug, Clone)]
pub struct RenderStats {
    pub pixels: u64,
    pub bands: usize,
    pub elapsed: Duration,
    /// Camera samples that ran out of ray budget
    pub capped_samples: u64,
}

/// Render the scene into `image`, logging coarse progress.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    image: &mut ImageBuffer,
    config: &RenderConfig,
) -> RenderResult<RenderStats> {
    render_with_progress(scene, camera, image, config, |progress| {
        log::info!(
            "Rendering: {:.0}% ({}/{} pixels)",
            progress.percent(),
            progress.completed,
            progress.total
        );
    })
}

/// Render the scene into `image`, calling `on_progress` every
/// [`PROGRESS_GRANULARITY`] completed pixels.
///
/// `on_progress` runs on worker threads.
pub fn render_with_progress<F>(
    scene: &Scene,
    camera: &Camera,
    image: &mut ImageBuffer,
    config: &RenderConfig,
    on_progress: F,
) -> RenderResult<RenderStats>
where
    F: Fn(RenderProgress) + Sync,
{
    if !scene.is_committed() {
        return Err(RenderError::SceneNotCommitted);
    }
    if image.is_empty() {
        return Err(RenderError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }
    if camera.image_width != image.width || camera.image_height != image.height {
        return Err(RenderError::ResolutionMismatch {
            camera_width: camera.image_width,
            camera_height: camera.image_height,
            image_width: image.width,
            image_height: image.height,
        });
    }
    if config.pixel_samples == 0 {
        return Err(RenderError::NoPixelSamples);
    }

    let start = Instant::now();
    let width = image.width;
    let total = width as u64 * image.height as u64;
    let bands = generate_bands(
        image.height,
        config.band_count.unwrap_or_else(hardware_concurrency),
    );
    let base_seed = config.seed.unwrap_or_else(rand::random);

    log::info!(
        "Rendering {}x{} in {} bands, {} spp, {} indirect, depth {}",
        width,
        image.height,
        bands.len(),
        config.pixel_samples,
        config.indirect_samples,
        config.max_depth
    );

    // Hand each band exclusive ownership of its rows
    let runs = image.rows_mut(bands.iter().map(Band::rows));
    let work: Vec<(Band, &mut [Color])> = bands.iter().copied().zip(runs).collect();

    let integrator = Integrator::new(scene, config);
    let completed = AtomicU64::new(0);
    let capped = AtomicU64::new(0);

    work.into_par_iter().for_each(|(band, pixels)| {
        let mut rng = StdRng::seed_from_u64(band_seed(base_seed, band.index));

        for (row, line) in pixels.chunks_mut(width as usize).enumerate() {
            let y = band.y_start + row as u32;

            for (x, pixel) in line.iter_mut().enumerate() {
                let (color, capped_samples) =
                    render_pixel(camera, &integrator, x as u32, y, config, &mut rng);
                *pixel = color;
                if capped_samples > 0 {
                    capped.fetch_add(capped_samples, Ordering::Relaxed);
                }

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_GRANULARITY == 0 {
                    on_progress(RenderProgress {
                        completed: done,
                        total,
                    });
                }
            }
        }
    });

    let stats = RenderStats {
        pixels: completed.load(Ordering::Relaxed),
        bands: bands.len(),
        elapsed: start.elapsed(),
        capped_samples: capped.load(Ordering::Relaxed),
    };

    if stats.capped_samples > 0 {
        log::warn!(
            "{} camera samples hit the cap of {} rays",
            stats.capped_samples,
            config.max_rays_per_sample
        );
    }
    log::info!("Rendered {} pixels in {:?}", stats.pixels, stats.elapsed);

    Ok(stats)
}

/// Average `pixel_samples` jittered camera samples for pixel (x, y).
///
/// Returns the color and how many of the samples exhausted their ray budget.
pub fn render_pixel(
    camera: &Camera,
    integrator: &Integrator<'_>,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> (Color, u64) {
    let mut pixel_color = Color::ZERO;
    let mut capped = 0;

    for _ in 0..config.pixel_samples {
        let ray = camera.get_ray(x, y, rng);
        let mut budget = RayBudget::new(config.max_rays_per_sample);
        pixel_color += integrator.radiance(ray.origin, ray.direction, rng, 0, &mut budget);
        if budget.is_exhausted() {
            capped += 1;
        }
    }

    // Average the samples
    (pixel_color / config.pixel_samples as f32, capped)
}

/// Decorrelated per-band seed.
fn band_seed(base: u64, index: usize) -> u64 {
    base ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
