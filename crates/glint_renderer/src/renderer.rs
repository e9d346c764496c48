//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with a bounded depth
//! - Sky gradient on miss
//! - Square-root gamma and 8-bit tone mapping

use crate::{Camera, FrameBuffer, World};
use glint_math::{Color, Ray};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Default maximum bounce count.
pub const DEFAULT_MAX_DEPTH: u32 = 7;

/// Secondary rays start this far along to avoid self-intersection acne.
pub const T_MIN: f64 = 1e-3;

/// Traces rays through a world snapshot.
///
/// The world sits behind an `Arc` so render jobs can hold it while the
/// owner edits its own copy (`world_mut` clones on write when shared).
#[derive(Debug, Clone)]
pub struct PathTracer {
    world: Arc<World>,
    max_depth: u32,
}

impl PathTracer {
    pub fn new(world: World) -> Self {
        Self {
            world: Arc::new(world),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access. If a render still holds the current snapshot
    /// the world is cloned first, leaving that render untouched.
    pub fn world_mut(&mut self) -> &mut World {
        Arc::make_mut(&mut self.world)
    }

    pub fn shared_world(&self) -> Arc<World> {
        Arc::clone(&self.world)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.max_depth = max_depth;
    }

    /// Radiance carried back along `ray`.
    pub fn color(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        ray_color(ray, &self.world, self.max_depth, rng)
    }
}

/// Compute the color seen by a ray.
///
/// Each bounce adds the surface's emission to the attenuated radiance of
/// the scattered ray. Absorption ends the path with emission only.
pub fn ray_color(ray: &Ray, world: &World, depth: u32, rng: &mut dyn RngCore) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, T_MIN, f64::INFINITY) else {
        return sky_gradient(ray);
    };

    let emission = rec.material.emitted(rec.u, rec.v, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            emission + result.attenuation * ray_color(&result.scattered, world, depth - 1, rng)
        }
        None => emission,
    }
}

/// Vertical blend from white at the horizon to sky blue straight up.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    Color::ONE * (1.0 - a) + Color::new(0.5, 0.7, 1.0) * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

#[inline]
fn to_byte(channel: f64) -> u32 {
    (256.0 * linear_to_gamma(channel).clamp(0.0, 0.99)) as u32
}

/// Pack an averaged linear color as opaque `0xFFRRGGBB`.
pub fn color_to_argb(color: Color) -> u32 {
    0xFF00_0000 | (to_byte(color.x) << 16) | (to_byte(color.y) << 8) | to_byte(color.z)
}

/// Produces the averaged linear color of image pixel `(i, j)`, where `j`
/// counts rows from the bottom.
///
/// This is the unit of work the render controller farms out.
pub trait PixelShader: Send + Sync {
    fn shade(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Color;
}

/// Shades pixels by path tracing through a camera.
#[derive(Debug, Clone)]
pub struct SceneShader {
    tracer: PathTracer,
    camera: Camera,
}

impl SceneShader {
    pub fn new(tracer: PathTracer, camera: Camera) -> Self {
        Self { tracer, camera }
    }
}

impl PixelShader for SceneShader {
    fn shade(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Color {
        render_pixel(&self.tracer, &self.camera, i, j, rng)
    }
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(
    tracer: &PathTracer,
    camera: &Camera,
    i: u32,
    j: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let max_x = (camera.image_width().max(2) - 1) as f64;
    let max_y = (camera.image_height().max(2) - 1) as f64;
    let samples = camera.samples_per_pixel().max(1);

    let mut pixel_color = Color::ZERO;
    for _ in 0..samples {
        let u = (i as f64 + rng.gen::<f64>()) / max_x;
        let v = (j as f64 + rng.gen::<f64>()) / max_y;
        let ray = camera.generate_ray(u, v, rng);
        pixel_color += tracer.color(&ray, rng);
    }

    pixel_color / samples as f64
}

/// Render the whole frame on the calling thread.
pub fn render(tracer: &PathTracer, camera: &Camera, buffer: &FrameBuffer, rng: &mut dyn RngCore) {
    let (width, height) = (buffer.width(), buffer.height());
    for j in 0..height {
        for i in 0..width {
            let color = render_pixel(tracer, camera, i, j, rng);
            buffer.set(i, height - 1 - j, color_to_argb(color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use glint_math::{Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn light_world() -> World {
        let mut world = World::new();
        world.add(Sphere::new(
            Point3::new(0.0, 0.0, -5.0),
            1.0,
            Arc::new(Material::emissive(Color::new(1.0, 0.0, 0.0), 1.0)),
        ));
        world
    }

    #[test]
    fn test_miss_returns_sky() {
        let tracer = PathTracer::new(World::new());
        let mut rng = StdRng::seed_from_u64(42);

        let up = Ray::new(Point3::ZERO, Vec3::Y);
        assert_eq!(tracer.color(&up, &mut rng), Color::new(0.5, 0.7, 1.0));

        let down = Ray::new(Point3::ZERO, -Vec3::Y);
        assert_eq!(tracer.color(&down, &mut rng), Color::ONE);
    }

    #[test]
    fn test_depth_zero_is_black() {
        let world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Point3::ZERO, Vec3::Y);
        assert_eq!(ray_color(&ray, &world, 0, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_emissive_hit() {
        let mut world = World::new();
        world.add(Sphere::new(
            Point3::new(0.0, 0.0, -5.0),
            1.0,
            Arc::new(Material::emissive(Color::new(1.0, 0.5, 0.0), 3.0)),
        ));
        let tracer = PathTracer::new(world);
        let mut rng = StdRng::seed_from_u64(42);

        // Emission is color * intensity, with no further bounces
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(tracer.color(&ray, &mut rng), Color::new(3.0, 1.5, 0.0));

        // A miss still sees the sky
        let up = Ray::new(Point3::ZERO, Vec3::Y);
        assert_eq!(tracer.color(&up, &mut rng), Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn test_diffuse_bounded_by_sky() {
        let mut world = World::new();
        world.add(Sphere::new(
            Point3::new(0.0, 0.0, -2.0),
            0.5,
            Arc::new(Material::diffuse(Color::splat(0.5))),
        ));
        let tracer = PathTracer::new(world);
        let mut rng = StdRng::seed_from_u64(7);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        for _ in 0..50 {
            let c = tracer.color(&ray, &mut rng);
            assert!(c.min_element() >= 0.0);
            // One diffuse bounce at albedo 0.5 under a sky of at most 1.0
            assert!(c.max_element() <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn test_tone_mapping() {
        assert_eq!(color_to_argb(Color::ZERO), 0xFF00_0000);
        // 256 * 0.99 truncates to 253
        assert_eq!(color_to_argb(Color::ONE), 0xFFFD_FDFD);
        assert_eq!(color_to_argb(Color::splat(4.0)), 0xFFFD_FDFD);
        // sqrt(0.25) = 0.5 -> 128
        assert_eq!(color_to_argb(Color::new(0.25, 0.0, 0.0)), 0xFF80_0000);
        // Negative channels map to zero
        assert_eq!(color_to_argb(Color::new(-1.0, 0.0, 0.0)), 0xFF00_0000);
    }

    #[test]
    fn test_world_copy_on_write() {
        let mut tracer = PathTracer::new(light_world());
        let snapshot = tracer.shared_world();
        let id = tracer.world().list_ids()[0].clone();

        tracer
            .world_mut()
            .translate_by_id(&id, Vec3::X)
            .expect("known id");

        let moved = tracer.world().get(&id).expect("present").bounding_box();
        let original = snapshot.get(&id).expect("present").bounding_box();
        assert!((moved.min().x - original.min().x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_orientation() {
        // Light above the axis must land in the top half of the buffer
        let mut world = World::new();
        world.add(Sphere::new(
            Point3::new(0.0, 1.5, -3.0),
            1.0,
            Arc::new(Material::emissive(Color::new(1.0, 0.0, 0.0), 1.0)),
        ));
        let tracer = PathTracer::new(world).with_max_depth(1);
        let camera = Camera::new(Point3::ZERO, Point3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_resolution(9, 9)
            .with_lens(90.0, 0.0, 1.0)
            .with_samples(1);
        let buffer = FrameBuffer::new(9, 9);
        let mut rng = StdRng::seed_from_u64(3);

        render(&tracer, &camera, &buffer, &mut rng);

        let is_red = |p: u32| p & 0x00FF_FFFF == 0x00FD_0000;
        assert!(is_red(buffer.get(4, 2).expect("in range")));
        assert!(!is_red(buffer.get(4, 8).expect("in range")));
    }
}
