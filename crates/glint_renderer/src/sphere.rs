//! Sphere primitive for ray tracing.

use crate::{hittable::HitRecord, LineSegment, Material};
use glint_math::{Aabb, Interval, Point3, Ray, Vec3};
use std::f64::consts::PI;
use std::sync::Arc;
use uuid::Uuid;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    id: String,
    center: Point3,
    radius: f64,
    material: Arc<Material>,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Point3, radius: f64, material: Arc<Material>) -> Self {
        Self {
            id: format!("Sphere[{}]", Uuid::new_v4()),
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f64, f64) {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }

    /// Solve `|O + tD - C|^2 = r^2` with the half-b form of the quadratic.
    ///
    /// Takes the nearer root inside `ray_t`, falling back to the farther one.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let oc = ray.origin() - self.center;
        let a = ray.direction().length_squared();
        let half_b = oc.dot(ray.direction());
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        let mut root = (-half_b - sqrtd) / a;
        if !ray_t.contains(root) {
            root = (-half_b + sqrtd) / a;
            if !ray_t.contains(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Some(HitRecord::new(
            ray,
            root,
            outward_normal,
            &self.material,
            Self::get_sphere_uv(outward_normal),
        ))
    }

    pub fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(self.center - rvec, self.center + rvec)
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.center += offset;
    }

    /// Latitude/longitude wire cage with `floor(coefficient * 10)` steps
    /// per direction.
    pub fn linearize(&self, coefficient: f64) -> Vec<LineSegment> {
        let steps = (coefficient * 10.0) as usize;
        let mut segments = Vec::with_capacity(2 * steps * steps);
        let point = |theta: f64, phi: f64| {
            self.center
                + self.radius * Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos())
        };

        // Rings of constant phi
        for i in 0..steps {
            let theta1 = 2.0 * PI * i as f64 / steps as f64;
            let theta2 = 2.0 * PI * (i + 1) as f64 / steps as f64;
            for j in 0..steps {
                let phi = PI * j as f64 / steps as f64;
                segments.push(LineSegment::new(point(theta1, phi), point(theta2, phi)));
            }
        }

        // Meridians
        for i in 0..steps {
            let theta = 2.0 * PI * i as f64 / steps as f64;
            for j in 0..steps {
                let phi1 = PI * j as f64 / steps as f64;
                let phi2 = PI * (j + 1) as f64 / steps as f64;
                segments.push(LineSegment::new(point(theta, phi1), point(theta, phi2)));
            }
        }

        segments
    }
}
