use std::f64::consts::PI;

use glam::DVec2;

use crate::constants::{ABS_TOLERANCE, REL_TOLERANCE};

/// An (x, y) position or velocity in arena coordinates.
pub type Coordinate = DVec2;

/// Polar helpers on top of glam's cartesian vector.
pub trait CoordinateExt {
    fn from_polar(r: f64, theta: f64) -> Self;
    fn magnitude(&self) -> f64;
    /// Angle from the origin in (-PI, PI].
    fn polar_angle(&self) -> f64;
    fn distance_to(&self, other: Self) -> f64;
    /// Angle of the vector from `self` to `other`.
    fn bearing_to(&self, other: Self) -> f64;
    fn rotated(&self, angle: f64) -> Self;
}

impl CoordinateExt for DVec2 {
    fn from_polar(r: f64, theta: f64) -> Self {
        DVec2::new(r * theta.cos(), r * theta.sin())
    }

    fn magnitude(&self) -> f64 {
        self.length()
    }

    fn polar_angle(&self) -> f64 {
        normalize_angle(self.y.atan2(self.x))
    }

    fn distance_to(&self, other: Self) -> f64 {
        (other - *self).length()
    }

    fn bearing_to(&self, other: Self) -> f64 {
        (other - *self).polar_angle()
    }

    fn rotated(&self, angle: f64) -> Self {
        DVec2::from_polar(self.magnitude(), self.y.atan2(self.x) + angle)
    }
}

/// Normalize angle to (-PI, PI].
pub fn normalize_angle(mut a: f64) -> f64 {
    if !a.is_finite() {
        return a;
    }
    if a.abs() > 4.0 * PI {
        a %= 2.0 * PI;
    }
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Relative float closeness: within `REL_TOLERANCE` of the larger magnitude,
/// or `ABS_TOLERANCE` absolute.
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= (REL_TOLERANCE * b.abs()).max(REL_TOLERANCE * a.abs()) || diff <= ABS_TOLERANCE
}

/// Inclusive range check that also accepts values within float noise of either end.
pub fn float_in_range(value: f64, lower: f64, upper: f64) -> bool {
    (lower <= value && value <= upper) || is_close(value, lower) || is_close(value, upper)
}
