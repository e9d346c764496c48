//! Hit records and the closed set of traceable primitives.

use crate::{Material, Sphere, Triangle};
use glint_math::{Aabb, Interval, Point3, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Point3,
    /// Unit surface normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a Material,
    /// Surface coordinates (sphere uv, triangle barycentrics)
    pub u: f64,
    pub v: f64,
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record from a primitive's outward normal.
    ///
    /// The stored normal is flipped when the ray arrives from inside, so
    /// `front_face` tells the two cases apart afterwards.
    pub fn new(
        ray: &Ray,
        t: f64,
        outward_normal: Vec3,
        material: &'a Material,
        (u, v): (f64, f64),
    ) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            material,
            u,
            v,
            t,
            front_face,
        }
    }
}

/// Straight edge used by the wireframe preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point3,
    pub end: Point3,
}

impl LineSegment {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }
}

/// Anything a ray can hit. BVH nodes live in [`crate::Bvh`] and refer to
/// primitives by index, so they are not a variant here.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Primitive {
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            Primitive::Sphere(s) => s.hit(ray, ray_t),
            Primitive::Triangle(t) => t.hit(ray, ray_t),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(s) => s.bounding_box(),
            Primitive::Triangle(t) => t.bounding_box(),
        }
    }

    pub fn translate(&mut self, offset: Vec3) {
        match self {
            Primitive::Sphere(s) => s.translate(offset),
            Primitive::Triangle(t) => t.translate(offset),
        }
    }

    /// Stable identifier assigned at construction.
    pub fn id(&self) -> &str {
        match self {
            Primitive::Sphere(s) => s.id(),
            Primitive::Triangle(t) => t.id(),
        }
    }

    pub fn material(&self) -> &Material {
        match self {
            Primitive::Sphere(s) => s.material(),
            Primitive::Triangle(t) => t.material(),
        }
    }

    /// Approximate the surface with line segments for the wireframe preview.
    pub fn linearize(&self, coefficient: f64) -> Vec<LineSegment> {
        match self {
            Primitive::Sphere(s) => s.linearize(coefficient),
            Primitive::Triangle(t) => t.linearize(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_front() {
        let mat = Material::diffuse(Vec3::splat(0.5));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = HitRecord::new(&ray, 4.0, Vec3::Z, &mat, (0.0, 0.0));

        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
        assert_eq!(rec.p, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_face_normal_back() {
        let mat = Material::diffuse(Vec3::splat(0.5));
        // Ray travelling the same way as the outward normal: we're inside
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Z, &mat, (0.0, 0.0));

        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::Z);
        assert!(rec.normal.dot(ray.direction()) < 0.0);
    }
}
