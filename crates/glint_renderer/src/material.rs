//! Surface scattering and emission.

use crate::hittable::HitRecord;
use glint_math::{near_zero, random_in_unit_sphere, reflect, refract, Color, Point3, Ray};
use rand::{Rng, RngCore};

/// Outgoing ray and per-channel attenuation chosen by a material.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub scattered: Ray,
    pub attenuation: Color,
}

/// How light interacts with a surface.
///
/// Shared read-only between primitives through `Arc<Material>`.
/// Attenuation channels are never negative.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Lambertian reflector.
    Diffuse { albedo: Color },
    /// Mirror-like reflector; `fuzz` in [0, 1] roughens the reflection.
    Metallic { albedo: Color, fuzz: f64 },
    /// Clear refractive material such as glass (1.5) or diamond (2.4).
    Dielectric { refractive_index: f64 },
    /// Light source. Absorbs every incoming ray.
    Emissive { color: Color, intensity: f64 },
}

impl Material {
    pub fn diffuse(albedo: Color) -> Self {
        Material::Diffuse {
            albedo: albedo.max(Color::ZERO),
        }
    }

    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn metallic(albedo: Color, fuzz: f64) -> Self {
        Material::Metallic {
            albedo: albedo.max(Color::ZERO),
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn dielectric(refractive_index: f64) -> Self {
        Material::Dielectric { refractive_index }
    }

    pub fn emissive(color: Color, intensity: f64) -> Self {
        Material::Emissive { color, intensity }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` when the ray is absorbed.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match *self {
            Material::Diffuse { albedo } => {
                let mut scatter_direction = rec.normal + random_in_unit_sphere(rng);

                // Catch degenerate scatter direction
                if near_zero(scatter_direction) {
                    scatter_direction = rec.normal;
                }

                Some(ScatterResult {
                    scattered: Ray::with_time(rec.p, scatter_direction, ray_in.time()),
                    attenuation: albedo,
                })
            }
            Material::Metallic { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal.normalize());
                let direction = reflected + fuzz * random_in_unit_sphere(rng);

                // Fuzz pushed the ray below the surface: absorbed
                if direction.dot(rec.normal) <= 0.0 {
                    return None;
                }

                Some(ScatterResult {
                    scattered: Ray::with_time(rec.p, direction, ray_in.time()),
                    attenuation: albedo,
                })
            }
            Material::Dielectric { refractive_index } => {
                let refraction_ratio = if rec.front_face {
                    1.0 / refractive_index
                } else {
                    refractive_index
                };

                let unit_direction = ray_in.direction().normalize();
                let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                // Total internal reflection
                let cannot_refract = refraction_ratio * sin_theta > 1.0;

                let direction = if cannot_refract
                    || reflectance(cos_theta, refraction_ratio) > rng.gen::<f64>()
                {
                    reflect(unit_direction, rec.normal)
                } else {
                    refract(unit_direction, rec.normal, refraction_ratio)
                };

                Some(ScatterResult {
                    scattered: Ray::with_time(rec.p, direction, ray_in.time()),
                    attenuation: Color::ONE,
                })
            }
            Material::Emissive { .. } => None,
        }
    }

    /// Light emitted at the given surface coordinates and point.
    ///
    /// Black for everything except `Emissive`.
    pub fn emitted(&self, _u: f64, _v: f64, _p: Point3) -> Color {
        match *self {
            Material::Emissive { color, intensity } => color * intensity,
            _ => Color::ZERO,
        }
    }
}

/// Schlick's approximation for reflectance
fn reflectance(cosine: f64, ref_idx: f64) -> f64 {
    let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
