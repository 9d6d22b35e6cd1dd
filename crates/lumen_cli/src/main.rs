use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_core::{CameraConfig, Color, ImageBuffer, Material, Mesh, PointLight, Texture};
use lumen_math::Vec3;
use lumen_renderer::{render, Camera, RenderConfig, Scene};

/// Render the built-in box scene from a camera file.
///
/// The camera file holds three lines: eye position, view direction, and
/// field of view in degrees.
#[derive(Parser, Debug)]
#[command(name = "lumen", version)]
struct Args {
    /// Camera configuration file
    camera: PathBuf,

    /// Output image; `.ppm` is written directly, other extensions by format
    #[arg(default_value = "render.ppm")]
    output: PathBuf,

    /// Width of the rendered image
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Height of the rendered image
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Jittered camera samples per pixel
    #[arg(long = "spp", default_value_t = 4)]
    pixel_samples: u32,

    /// Hemisphere samples per bounce
    #[arg(long = "indirect", default_value_t = 8)]
    indirect_samples: u32,

    /// Maximum bounce depth
    #[arg(long = "depth", default_value_t = 5)]
    max_depth: u32,

    /// Fixed random seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            pixel_samples: self.pixel_samples,
            indirect_samples: self.indirect_samples,
            max_depth: self.max_depth,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Box room with coloured side walls, a checkered floor and a glowing
/// ceiling panel. Spans [-1, 1] on every axis; the open side faces -Z.
fn demo_scene() -> Scene {
    let mut scene = Scene::new();

    let white = scene.add_material(Material::diffuse(Color::splat(0.73)));
    let red = scene.add_material(Material::diffuse(Color::new(0.65, 0.05, 0.05)));
    let green = scene.add_material(Material::diffuse(Color::new(0.12, 0.45, 0.15)));
    let floor = scene.add_material(Material::default().with_texture(Texture::Checker {
        even: Color::splat(0.8),
        odd: Color::splat(0.2),
        scale: 8.0,
    }));
    let panel = scene.add_material(Material::diffuse(Color::ONE).with_emissivity(4.0));
    let glossy = scene.add_material(
        Material::diffuse(Color::new(0.2, 0.3, 0.8)).with_reflectivity(0.8),
    );

    // Walls, wound so normals point into the box
    scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, -1.0, -1.0), Vec3::Z * 2.0, Vec3::X * 2.0), floor);
    scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, 1.0, -1.0), Vec3::X * 2.0, Vec3::Z * 2.0), white);
    scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, -1.0, 1.0), Vec3::Y * 2.0, Vec3::X * 2.0), white);
    scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, -1.0, -1.0), Vec3::Y * 2.0, Vec3::Z * 2.0), red);
    scene.add_mesh(&Mesh::quad(Vec3::new(1.0, -1.0, -1.0), Vec3::Z * 2.0, Vec3::Y * 2.0), green);

    // Light panel just below the ceiling
    scene.add_mesh(
        &Mesh::quad(Vec3::new(-0.25, 0.99, -0.25), Vec3::X * 0.5, Vec3::Z * 0.5),
        panel,
    );

    // A glossy block on the floor, faces wound outwards
    let (lo, hi) = (Vec3::new(-0.6, -1.0, -0.1), Vec3::new(-0.1, -0.3, 0.4));
    let size = hi - lo;
    for mesh in [
        Mesh::quad(lo, Vec3::Y * size.y, Vec3::X * size.x),
        Mesh::quad(Vec3::new(hi.x, lo.y, lo.z), Vec3::Y * size.y, Vec3::Z * size.z),
        Mesh::quad(Vec3::new(lo.x, lo.y, hi.z), Vec3::X * size.x, Vec3::Y * size.y),
        Mesh::quad(lo, Vec3::Z * size.z, Vec3::Y * size.y),
        Mesh::quad(Vec3::new(lo.x, hi.y, lo.z), Vec3::Z * size.z, Vec3::X * size.x),
    ] {
        scene.add_mesh(&mesh, glossy);
    }

    scene.add_light(PointLight::new(Vec3::new(0.0, 0.9, 0.0), Color::splat(0.8)));
    scene.add_light(PointLight::new(Vec3::new(0.6, 0.5, -0.8), Color::new(0.3, 0.25, 0.2)));

    scene
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let camera_config = CameraConfig::load(&args.camera)
        .with_context(|| format!("reading camera file {}", args.camera.display()))?;
    log::info!(
        "Camera at {:?} looking along {:?}, fov {:.1} degrees",
        camera_config.position,
        camera_config.direction,
        camera_config.fov.to_degrees()
    );

    let mut scene = demo_scene();
    scene.commit().context("building scene")?;

    let camera = Camera::new(&camera_config, args.width, args.height);
    let mut image = ImageBuffer::new(args.width, args.height);
    let stats = render(&scene, &camera, &mut image, &args.render_config()).context("rendering")?;

    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!(
        "Done: {} pixels in {} bands, {:.2}s",
        stats.pixels,
        stats.bands,
        stats.elapsed.as_secs_f32()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("lumen").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["cam.txt"]).unwrap();
        assert_eq!(args.camera, PathBuf::from("cam.txt"));
        assert_eq!(args.output, PathBuf::from("render.ppm"));
        assert_eq!((args.width, args.height), (320, 240));

        let config = args.render_config();
        let defaults = RenderConfig::default();
        assert_eq!(config.pixel_samples, defaults.pixel_samples);
        assert_eq!(config.indirect_samples, defaults.indirect_samples);
        assert_eq!(config.max_depth, defaults.max_depth);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_options() {
        let args = parse(&[
            "cam.txt", "out.png", "--width", "64", "--spp", "2", "--indirect", "3", "--depth",
            "1", "--seed", "9",
        ])
        .unwrap();
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.width, 64);
        assert_eq!(args.height, 240);

        let config = args.render_config();
        assert_eq!(config.pixel_samples, 2);
        assert_eq!(config.indirect_samples, 3);
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_bad_arguments() {
        assert_eq!(
            parse(&[]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert!(parse(&["cam.txt", "--width"]).is_err());
        assert_eq!(
            parse(&["cam.txt", "--width", "wide"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["cam.txt", "--bogus"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert!(parse(&["cam.txt", "a.ppm", "b.ppm"]).is_err());
        assert_eq!(
            parse(&["--help"]).unwrap_err().kind(),
            ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_demo_scene_commits() {
        let mut scene = demo_scene();
        scene.commit().unwrap();
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.triangles().len(), 2 * 11);

        // Looking in through the open side hits the front of the back wall
        let ray = lumen_math::Ray::new(Vec3::new(0.3, 0.2, -3.0), Vec3::Z);
        let hit = scene.intersect(&ray, 0.0, f32::INFINITY).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-4);
        assert!(hit.triangle.normal().dot(ray.direction) < 0.0);
    }

    #[test]
    fn test_demo_block_faces_outwards() {
        let mut scene = demo_scene();
        scene.commit().unwrap();

        // Hit each side of the block from outside, away from the quad diagonals;
        // every face must face the ray
        let inside = Vec3::new(-0.3, -0.63, 0.08);
        for direction in [Vec3::X, -Vec3::X, Vec3::Z, -Vec3::Z, -Vec3::Y] {
            let ray = lumen_math::Ray::new(inside - direction * 0.5, direction);
            let hit = scene.intersect(&ray, 0.0, f32::INFINITY).unwrap();
            assert!(
                hit.triangle.normal().dot(direction) < 0.0,
                "face hit along {direction:?} points inwards"
            );
        }
    }
}
