//! Reflection and refraction helpers on top of glam's `DVec3`.

use crate::Vec3;

/// Squared-length threshold below which a direction counts as degenerate.
const NEAR_ZERO_SQ: f64 = 1e-8;

/// Reflect `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the unit vector `uv` through a surface with unit normal `n`.
///
/// `etai_over_etat` is the ratio of refractive indices (incident over
/// transmitted). The caller handles total internal reflection.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f64) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// True if every component is close enough to zero that the vector is
/// unusable as a direction.
#[inline]
pub fn near_zero(v: Vec3) -> bool {
    v.length_squared() < NEAR_ZERO_SQ
}
