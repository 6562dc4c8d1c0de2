//! Animatable value types
//!
//! Linear interpolation for vectors and colors.

use crate::{Color, Vec3};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Blend toward `other`; `t` is not clamped
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

// ============================================================================
// Vec3 Implementation
// ============================================================================

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_overshoot_is_not_clamped() {
        let a = Vec3::ZERO;
        let b = Vec3::new(0.0, 1.0, 0.0);

        assert!((a.lerp(&b, 1.2).y - 1.2).abs() < 1e-6);
        assert!((a.lerp(&b, -0.1).y + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_vec3_interpolation() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 20.0, 30.0);
        let mid = a.lerp(&b, 0.5);

        assert!((mid.x - 5.0).abs() < 1e-6);
        assert!((mid.y - 10.0).abs() < 1e-6);
        assert!((mid.z - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_color_interpolation_endpoints() {
        let a = Color::rgb(0.2, 0.2, 0.2);
        let b = Color::rgb(1.0, 0.0, 0.5);

        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
