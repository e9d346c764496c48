use crate::Vec3;

/// A ray in 3D space with origin, direction, and time.
///
/// Rays are immutable once built. `time` defaults to 0 and is carried
/// through scattering unchanged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f64,
}

impl Ray {
    /// Create a new ray at time 0.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_time(origin, direction, 0.0)
    }

    /// Create a new ray with an explicit time value.
    pub fn with_time(origin: Vec3, direction: Vec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}
