//! Glint math - f64 vector algebra, rays and bounding boxes.
//!
//! `Vec3` is glam's double-precision vector. It doubles as `Color`
//! (linear RGB, unbounded above) and `Point3` (a position).

// Re-export glam for convenience
pub use glam;

/// 3-component f64 vector.
pub type Vec3 = glam::DVec3;
/// Linear RGB color. Channels are in [0, inf) until tone mapping.
pub type Color = Vec3;
/// A position in world space.
pub type Point3 = Vec3;

mod aabb;
mod interval;
mod ray;
mod sampling;
mod vector;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use sampling::{random_in_unit_disk, random_in_unit_sphere, random_vec3};
pub use vector::{near_zero, reflect, refract};
