//! Interactive thin-lens camera.
//!
//! Orientation is stored as yaw/pitch. Every mutator ends in
//! [`Camera::recompute`], so the basis and viewport are never stale when a
//! ray is generated.

use glint_math::{random_in_unit_disk, Interval, Point3, Ray, Vec3};
use rand::RngCore;
use std::f64::consts::FRAC_PI_2;

/// Pitch stays this far away from straight up/down so `vup x w` never
/// degenerates.
const PITCH_MARGIN: f64 = 0.01;
const MAX_PITCH: f64 = FRAC_PI_2 - PITCH_MARGIN;

/// Discrete movement commands from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    image_width: u32,
    image_height: u32,
    samples_per_pixel: u32,

    // Positioning
    origin: Point3,
    target: Point3,
    vup: Vec3,
    yaw: f64,
    pitch: f64,
    movement_speed: f64,

    // Lens settings
    vfov: f64, // Vertical field of view in degrees
    aperture: f64,
    focus_distance: f64,

    // Derived by recompute()
    u: Vec3,
    v: Vec3,
    w: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    lower_left_corner: Point3,
}

impl Camera {
    /// Camera at `origin` looking at `target`, with the default lens and
    /// a 400x400 image.
    pub fn new(origin: Point3, target: Point3, vup: Vec3) -> Self {
        let mut camera = Self {
            image_width: 400,
            image_height: 400,
            samples_per_pixel: 5,
            origin,
            target,
            vup,
            yaw: 0.0,
            pitch: 0.0,
            movement_speed: 0.1,
            vfov: 90.0,
            aperture: 0.1,
            focus_distance: 10.0,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            lower_left_corner: Point3::ZERO,
        };
        camera.look_at(target);
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.set_resolution(width, height);
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f64, aperture: f64, focus_distance: f64) -> Self {
        self.vfov = vfov;
        self.aperture = aperture;
        self.focus_distance = focus_distance;
        self.recompute();
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.set_samples_per_pixel(samples_per_pixel);
        self
    }

    /// Point the camera at `target`, deriving yaw and pitch from the
    /// direction. A target equal to the origin keeps the current heading.
    pub fn look_at(&mut self, target: Point3) {
        if let Some(forward) = (target - self.origin).try_normalize() {
            self.yaw = forward.z.atan2(forward.x);
            self.pitch = forward.y.clamp(-1.0, 1.0).asin();
        }
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.recompute();
    }

    /// Re-derive target, basis and viewport from the primary fields.
    pub fn recompute(&mut self) {
        self.target = self.origin + self.forward();
        self.w = (self.origin - self.target).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        let (half_width, half_height) = self.half_extents();
        self.lower_left_corner = self.origin
            - (self.u * half_width + self.v * half_height + self.w) * self.focus_distance;
        self.horizontal = self.u * 2.0 * half_width * self.focus_distance;
        self.vertical = self.v * 2.0 * half_height * self.focus_distance;
    }

    fn half_extents(&self) -> (f64, f64) {
        let half_height = (self.vfov.to_radians() / 2.0).tan();
        (self.aspect_ratio() * half_height, half_height)
    }

    /// Unit view direction from yaw and pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        )
    }

    /// Ray through the viewport point `(s, t)`, both in [0, 1] with (0, 0)
    /// at the lower-left corner.
    ///
    /// With a non-zero aperture the origin is jittered across the lens disk.
    pub fn generate_ray(&self, s: f64, t: f64, rng: &mut dyn RngCore) -> Ray {
        let offset = if self.lens_radius() > 0.0 {
            let rd = self.lens_radius() * random_in_unit_disk(rng);
            self.u * rd.x + self.v * rd.y
        } else {
            Vec3::ZERO
        };

        Ray::new(
            self.origin + offset,
            self.lower_left_corner + s * self.horizontal + t * self.vertical - self.origin - offset,
        )
    }

    /// Screen position of a world point, or `None` when it is not in front
    /// of the camera. Row 0 is the top of the image.
    ///
    /// Points close to the camera plane land far off screen; coordinates
    /// saturate at the `i32` range and are left to the line clipper.
    pub fn project(&self, point: Point3) -> Option<(i32, i32)> {
        let local = point - self.origin;
        let x = local.dot(self.u);
        let y = local.dot(self.v);
        let z = local.dot(self.w);

        if z >= 0.0 {
            return None;
        }

        let (half_width, half_height) = self.half_extents();
        let w = self.image_width as f64 / 2.0;
        let h = self.image_height as f64 / 2.0;
        let screen_x = (x / (-z * half_width)) * w + w;
        let row = self.image_height as f64 - ((y / (-z * half_height)) * h + h);
        if screen_x.is_nan() || row.is_nan() {
            return None;
        }

        let range = Interval::new(i32::MIN as f64, i32::MAX as f64);
        Some((range.clamp(screen_x) as i32, range.clamp(row) as i32))
    }

    // =========================================================================
    // Movement
    // =========================================================================

    fn move_in_direction(&mut self, direction: Vec3) {
        self.origin += direction * self.movement_speed;
        self.recompute();
    }

    pub fn move_forward(&mut self) {
        self.move_in_direction(self.forward());
    }

    pub fn move_backward(&mut self) {
        self.move_in_direction(-self.forward());
    }

    pub fn move_left(&mut self) {
        self.move_in_direction(Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos()));
    }

    pub fn move_right(&mut self) {
        self.move_in_direction(Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos()));
    }

    pub fn move_up(&mut self) {
        self.move_in_direction(self.vup);
    }

    pub fn move_down(&mut self) {
        self.move_in_direction(-self.vup);
    }

    pub fn step(&mut self, movement: Movement) {
        match movement {
            Movement::Forward => self.move_forward(),
            Movement::Backward => self.move_backward(),
            Movement::Left => self.move_left(),
            Movement::Right => self.move_right(),
            Movement::Up => self.move_up(),
            Movement::Down => self.move_down(),
        }
    }

    /// Turn by the given deltas (radians). Yaw is unbounded; pitch is
    /// clamped just short of the poles.
    pub fn rotate(&mut self, delta_yaw: f64, delta_pitch: f64) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.recompute();
    }

    pub fn adjust_yaw(&mut self, delta: f64) {
        self.rotate(delta, 0.0);
    }

    pub fn adjust_pitch(&mut self, delta: f64) {
        self.rotate(0.0, delta);
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn set_vfov(&mut self, vfov: f64) {
        self.vfov = vfov;
        self.recompute();
    }

    pub fn set_aperture(&mut self, aperture: f64) {
        self.aperture = aperture;
    }

    pub fn set_focus_distance(&mut self, focus_distance: f64) {
        self.focus_distance = focus_distance;
        self.recompute();
    }

    pub fn set_vup(&mut self, vup: Vec3) {
        self.vup = vup;
        self.recompute();
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
        self.recompute();
    }

    /// Resolution drives the aspect ratio, so the viewport is rebuilt.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.image_width = width;
        self.image_height = height;
        self.recompute();
    }

    pub fn set_samples_per_pixel(&mut self, samples: u32) {
        self.samples_per_pixel = samples.max(1);
    }

    pub fn set_movement_speed(&mut self, speed: f64) {
        self.movement_speed = speed;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn target(&self) -> Point3 {
        self.target
    }

    pub fn vup(&self) -> Vec3 {
        self.vup
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn vfov(&self) -> f64 {
        self.vfov
    }

    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    pub fn lens_radius(&self) -> f64 {
        self.aperture / 2.0
    }

    pub fn focus_distance(&self) -> f64 {
        self.focus_distance
    }

    pub fn movement_speed(&self) -> f64 {
        self.movement_speed
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.image_width as f64 / self.image_height as f64
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Camera basis `(u, v, w)`; `w` points away from the view direction.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn lower_left_corner(&self) -> Point3 {
        self.lower_left_corner
    }

    pub fn horizontal(&self) -> Vec3 {
        self.horizontal
    }

    pub fn vertical(&self) -> Vec3 {
        self.vertical
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::ONE, Point3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pinhole() -> Camera {
        Camera::new(Point3::ZERO, Point3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_resolution(200, 100)
            .with_lens(90.0, 0.0, 1.0)
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_camera_basis() {
        let camera = pinhole();
        let (u, v, w) = camera.basis();

        assert_close(w, Vec3::Z);
        assert_close(u, Vec3::X);
        assert_close(v, Vec3::Y);
        assert_close(camera.target(), Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_viewport_extent() {
        let camera = pinhole();

        // 90 degree fov at focus distance 1: height 2, width 2 * aspect
        assert_close(camera.vertical(), Vec3::new(0.0, 2.0, 0.0));
        assert_close(camera.horizontal(), Vec3::new(4.0, 0.0, 0.0));
        assert_close(camera.lower_left_corner(), Point3::new(-2.0, -1.0, -1.0));
    }

    #[test]
    fn test_corner_rays_without_aperture() {
        let camera = pinhole();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = camera.generate_ray(0.0, 0.0, &mut rng);
        assert_eq!(ray.origin(), camera.origin());
        assert_close(ray.at(1.0), camera.lower_left_corner());

        let ray = camera.generate_ray(1.0, 1.0, &mut rng);
        assert_close(
            ray.at(1.0),
            camera.lower_left_corner() + camera.horizontal() + camera.vertical(),
        );
    }

    #[test]
    fn test_depth_of_field_jitter_stays_on_lens() {
        let camera = pinhole().with_lens(90.0, 2.0, 5.0);
        let mut rng = StdRng::seed_from_u64(1);
        let focus_point = camera.lower_left_corner() + 0.5 * camera.horizontal() + 0.5 * camera.vertical();

        for _ in 0..100 {
            let ray = camera.generate_ray(0.5, 0.5, &mut rng);
            let offset = ray.origin() - camera.origin();
            assert!(offset.length() < camera.lens_radius());
            assert!(offset.dot(camera.basis().2).abs() < 1e-12);
            // Every jittered ray still passes through the focus point
            assert_close(ray.at(1.0), focus_point);
        }
    }

    #[test]
    fn test_look_at_derives_yaw_pitch() {
        let camera = Camera::default();
        let expected = (Point3::ZERO - Point3::ONE).normalize();
        assert_close(camera.forward(), expected);
        assert_close(camera.target(), camera.origin() + expected);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = pinhole();
        camera.adjust_pitch(10.0);
        assert!((camera.pitch() - MAX_PITCH).abs() < 1e-12);
        assert!(camera.basis().0.is_finite());

        camera.adjust_pitch(-100.0);
        assert!((camera.pitch() + MAX_PITCH).abs() < 1e-12);
    }

    #[test]
    fn test_yaw_unbounded() {
        let mut camera = pinhole();
        let start = camera.yaw();
        for _ in 0..10 {
            camera.adjust_yaw(1.0);
        }
        assert!((camera.yaw() - start - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_movement() {
        let mut camera = pinhole();
        camera.set_movement_speed(0.5);

        camera.move_forward();
        assert_close(camera.origin(), Point3::new(0.0, 0.0, -0.5));
        camera.move_backward();
        assert_close(camera.origin(), Point3::ZERO);

        // Looking down -Z, left is -X
        camera.step(Movement::Left);
        assert_close(camera.origin(), Point3::new(-0.5, 0.0, 0.0));
        camera.step(Movement::Right);
        camera.step(Movement::Up);
        assert_close(camera.origin(), Point3::new(0.0, 0.5, 0.0));
        camera.step(Movement::Down);
        assert_close(camera.origin(), Point3::ZERO);

        // Target follows the origin
        assert_close(camera.target(), Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_setters_recompute() {
        let mut camera = pinhole();
        camera.set_vfov(60.0);
        let half_height = (30.0f64).to_radians().tan();
        assert_close(camera.vertical(), Vec3::new(0.0, 2.0 * half_height, 0.0));

        camera.set_focus_distance(3.0);
        assert!((camera.lower_left_corner().z + 3.0).abs() < 1e-9);

        camera.set_resolution(100, 100);
        assert!((camera.horizontal().x - camera.vertical().y).abs() < 1e-9);
    }

    #[test]
    fn test_project() {
        let camera = pinhole().with_resolution(100, 100);

        // Straight ahead lands in the middle
        assert_eq!(camera.project(Point3::new(0.0, 0.0, -5.0)), Some((50, 50)));

        // Up is toward row 0
        let (_, y) = camera.project(Point3::new(0.0, 2.0, -5.0)).expect("in front");
        assert!(y < 50);

        // Behind the camera
        assert_eq!(camera.project(Point3::new(0.0, 0.0, 5.0)), None);
    }

    #[test]
    fn test_project_near_camera_plane() {
        let camera = pinhole().with_resolution(100, 100);

        // Just in front of the plane: saturates instead of overflowing
        let (x, y) = camera
            .project(Point3::new(0.0, -1.0, -1e-9))
            .expect("in front");
        assert_eq!(x, 50);
        assert_eq!(y, i32::MAX);

        let (x, y) = camera
            .project(Point3::new(-1.0, 1.0, -1e-300))
            .expect("in front");
        assert_eq!((x, y), (i32::MIN, i32::MIN));
    }
}
