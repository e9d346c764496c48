//! Rejection samplers.
//!
//! All samplers draw from an explicit RNG so callers choose between the
//! thread-local generator and a seeded one.

use crate::Vec3;
use rand::{Rng, RngCore};

/// Uniform random vector with each component in `[min, max)`.
pub fn random_vec3(rng: &mut dyn RngCore, min: f64, max: f64) -> Vec3 {
    Vec3::new(
        rng.gen_range(min..max),
        rng.gen_range(min..max),
        rng.gen_range(min..max),
    )
}

/// Uniform random point strictly inside the unit sphere.
///
/// Draws from the enclosing cube until a point lands inside. There is no
/// retry cap; the acceptance rate is about 52%.
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = random_vec3(rng, -1.0, 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform random point strictly inside the unit disk in the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_sphere_samples_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(random_in_unit_sphere(&mut rng).length() < 1.0);
        }
    }

    #[test]
    fn test_unit_disk_samples_flat() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = random_in_unit_disk(&mut rng);
            assert_eq!(p.z, 0.0);
            assert!(p.length() < 1.0);
        }
    }

    #[test]
    fn test_random_vec3_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let v = random_vec3(&mut rng, 0.5, 1.0);
            for c in v.to_array() {
                assert!((0.5..1.0).contains(&c));
            }
        }
    }
}
