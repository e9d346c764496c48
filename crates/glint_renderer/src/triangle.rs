//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{hittable::HitRecord, LineSegment, Material};
use glint_math::{Aabb, Interval, Point3, Ray, Vec3};
use std::sync::Arc;
use uuid::Uuid;

/// Determinant magnitude below which the ray counts as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// A flat-shaded triangle.
#[derive(Debug, Clone)]
pub struct Triangle {
    id: String,
    v0: Point3,
    v1: Point3,
    v2: Point3,
    material: Arc<Material>,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Point3, v1: Point3, v2: Point3, material: Arc<Material>) -> Self {
        Self {
            id: format!("Triangle[{}]", Uuid::new_v4()),
            v0,
            v1,
            v2,
            material,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vertices(&self) -> [Point3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle, or the triangle is degenerate
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        let outward_normal = edge1.cross(edge2).normalize();
        Some(HitRecord::new(ray, t, outward_normal, &self.material, (u, v)))
    }

    pub fn bounding_box(&self) -> Aabb {
        let min = self.v0.min(self.v1).min(self.v2);
        let max = self.v0.max(self.v1).max(self.v2);
        // from_points pads the flat axis
        Aabb::from_points(min, max)
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.v0 += offset;
        self.v1 += offset;
        self.v2 += offset;
    }

    /// The three edges.
    pub fn linearize(&self) -> Vec<LineSegment> {
        vec![
            LineSegment::new(self.v0, self.v1),
            LineSegment::new(self.v1, self.v2),
            LineSegment::new(self.v2, self.v0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Color;

    fn xy_triangle() -> Triangle {
        // Triangle in XY plane at z=-1
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            Arc::new(Material::diffuse(Color::new(0.5, 0.5, 0.5))),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = tri
            .hit(&ray, Interval::new(0.001, f64::INFINITY))
            .expect("ray aims at the triangle");
        assert!((rec.t - 1.0).abs() < 1e-9);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
        assert!(rec.u >= 0.0 && rec.v >= 0.0 && rec.u + rec.v <= 1.0);
    }

    #[test]
    fn test_triangle_back_face() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let rec = tri
            .hit(&ray, Interval::new(0.001, f64::INFINITY))
            .expect("back faces are hit too");
        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());

        // Outside the edges
        let ray = Ray::new(Vec3::new(0.9, 0.9, 0.0), -Vec3::Z);
        assert!(tri.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_triangle_parallel_ray() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        assert!(tri.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_degenerate_triangle_never_hit() {
        let tri = Triangle::new(
            Vec3::ZERO,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Arc::new(Material::diffuse(Color::ONE)),
        );
        let ray = Ray::new(Vec3::new(1.0, 1.0, 1.0), -Vec3::Z);
        assert!(tri.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_translate_moves_box() {
        let mut tri = xy_triangle();
        let before = tri.bounding_box();
        tri.translate(Vec3::new(0.0, 2.0, 0.0));
        let after = tri.bounding_box();

        assert!((after.min() - before.min() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-12);
        assert!(after.z.size() > 0.0);
        assert!(tri.id().starts_with("Triangle["));
    }

    #[test]
    fn test_linearize_edges() {
        let tri = xy_triangle();
        let edges = tri.linearize();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].start, edges[2].end);
    }
}
