use strike_shared::{Coordinate, CoordinateExt};

/// Below this squared relative speed the two objects are treated as moving together.
const DEGENERATE_RELATIVE_SPEED_SQ: f64 = 1e-12;

/// Relative width of the discriminant band reported as a single touch.
const TANGENT_TOLERANCE: f64 = 1e-12;

/// Two point objects moving with constant velocity.
///
/// The separation vector is affine in time, so the squared distance is the
/// quadratic `a*t^2 + b*t + c` with `a = |dv|^2`, `b = 2 dv.dp`, `c = |dp|^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeObjects {
    pub a_location: Coordinate,
    pub b_location: Coordinate,
    pub a_velocity: Coordinate,
    pub b_velocity: Coordinate,
}

/// When and where two objects are closest, restricted to `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    pub time: f64,
    pub distance: f64,
    pub locations: (Coordinate, Coordinate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub time: f64,
    pub locations: (Coordinate, Coordinate),
}

/// Times at which the separation equals a given distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossings {
    /// Always further apart than the distance.
    Never,
    /// Both crossings happened before `t = 0`.
    Passed,
    /// Already within the distance; leaves range at `exit` (infinite if never).
    Inside { exit: f64 },
    /// The paths just graze the distance at one instant.
    Touching { time: f64 },
    Ahead { enter: f64, exit: f64 },
}

impl RelativeObjects {
    /// Two stationary objects; add motion with [`with_velocities`](Self::with_velocities).
    pub fn new(a_location: Coordinate, b_location: Coordinate) -> Self {
        Self {
            a_location,
            b_location,
            a_velocity: Coordinate::ZERO,
            b_velocity: Coordinate::ZERO,
        }
    }

    pub fn with_velocities(mut self, a_velocity: Coordinate, b_velocity: Coordinate) -> Self {
        self.a_velocity = a_velocity;
        self.b_velocity = b_velocity;
        self
    }

    pub fn locations(&self, time: f64) -> (Coordinate, Coordinate) {
        (
            self.a_location + self.a_velocity * time,
            self.b_location + self.b_velocity * time,
        )
    }

    pub fn distance(&self, time: f64) -> f64 {
        let (a, b) = self.locations(time);
        a.distance_to(b)
    }

    /// Angle from object a to object b.
    pub fn angle(&self, time: f64) -> f64 {
        let (a, b) = self.locations(time);
        a.bearing_to(b)
    }

    fn quadratic(&self) -> (f64, f64, f64) {
        let dv = self.b_velocity - self.a_velocity;
        let dp = self.b_location - self.a_location;
        (dv.length_squared(), 2.0 * dv.dot(dp), dp.length_squared())
    }

    /// Closest approach in the causal future. A minimum in the past clamps to
    /// `t = 0`; equal velocities keep a constant separation, reported at `t = 0`.
    pub fn closest_approach(&self) -> Approach {
        let (a, b, _) = self.quadratic();

        let time = if a < DEGENERATE_RELATIVE_SPEED_SQ {
            0.0
        } else {
            (-b / (2.0 * a)).max(0.0)
        };

        let locations = self.locations(time);
        Approach {
            time,
            distance: locations.0.distance_to(locations.1),
            locations,
        }
    }

    pub fn times_within(&self, distance: f64) -> Crossings {
        let (a, b, c) = self.quadratic();
        let c = c - distance * distance;

        if a < DEGENERATE_RELATIVE_SPEED_SQ {
            return if c <= 0.0 {
                Crossings::Inside { exit: f64::INFINITY }
            } else {
                Crossings::Never
            };
        }

        // A tangent pass computes to a discriminant of either sign within
        // rounding of b^2, so treat that band as touching.
        let discriminant = b * b - 4.0 * a * c;
        let tangent_band = TANGENT_TOLERANCE * b * b;
        if discriminant < -tangent_band {
            return Crossings::Never;
        }

        if discriminant <= tangent_band {
            let time = -b / (2.0 * a);
            return if time >= 0.0 {
                Crossings::Touching { time }
            } else {
                Crossings::Passed
            };
        }

        // Numerically stable roots.
        let q = -0.5 * (b + b.signum() * discriminant.sqrt());
        let (r1, r2) = (q / a, c / q);
        let (enter, exit) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };

        if exit < 0.0 {
            Crossings::Passed
        } else if enter < 0.0 {
            Crossings::Inside { exit }
        } else {
            Crossings::Ahead { enter, exit }
        }
    }

    /// First future moment the objects come within `distance` of each other.
    ///
    /// `None` covers never, already inside, and only-in-the-past alike: only a
    /// future entry into range is actionable.
    pub fn first_time_within(&self, distance: f64) -> Option<Contact> {
        let time = match self.times_within(distance) {
            Crossings::Ahead { enter, .. } => enter,
            Crossings::Touching { time } => time,
            Crossings::Never | Crossings::Passed | Crossings::Inside { .. } => return None,
        };

        Some(Contact {
            time,
            locations: self.locations(time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn head_on() -> RelativeObjects {
        RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 0.0))
            .with_velocities(Coordinate::new(10.0, 0.0), Coordinate::new(-10.0, 0.0))
    }

    #[test]
    fn test_head_on_closest_approach() {
        let approach = head_on().closest_approach();
        assert!((approach.time - 5.0).abs() < 1e-12);
        assert!(approach.distance.abs() < 1e-12);
        assert!((approach.locations.0.x - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_head_on_first_time_within() {
        let contact = head_on().first_time_within(20.0).unwrap();
        assert!((contact.time - 4.0).abs() < 1e-12);
        assert!((contact.locations.0.distance_to(contact.locations.1) - 20.0).abs() < 1e-9);
        assert_eq!(
            head_on().times_within(20.0),
            Crossings::Ahead { enter: 4.0, exit: 6.0 }
        );
    }

    #[test]
    fn test_receding_objects_clamp_to_now() {
        let objects = RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 0.0))
            .with_velocities(Coordinate::ZERO, Coordinate::new(5.0, 0.0));
        let approach = objects.closest_approach();
        assert_eq!(approach.time, 0.0);
        assert!((approach.distance - 10.0).abs() < 1e-12);
        assert_eq!(objects.times_within(5.0), Crossings::Passed);
        assert!(objects.first_time_within(5.0).is_none());
    }

    #[test]
    fn test_equal_velocities_constant_separation() {
        let v = Coordinate::new(3.0, -2.0);
        let objects = RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 7.0))
            .with_velocities(v, v);
        let approach = objects.closest_approach();
        assert_eq!(approach.time, 0.0);
        assert!((approach.distance - 7.0).abs() < 1e-12);
        assert_eq!(objects.times_within(5.0), Crossings::Never);
        assert!(matches!(
            objects.times_within(8.0),
            Crossings::Inside { exit } if exit.is_infinite()
        ));
        assert!(objects.first_time_within(8.0).is_none());
    }

    #[test]
    fn test_already_inside_is_not_a_future_event() {
        let objects = head_on();
        let later = RelativeObjects {
            a_location: objects.locations(5.0).0,
            b_location: objects.locations(5.0).1,
            ..objects
        };
        assert!(matches!(later.times_within(20.0), Crossings::Inside { .. }));
        assert!(later.first_time_within(20.0).is_none());
    }

    #[test]
    fn test_miss_never_within() {
        let objects = RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 30.0))
            .with_velocities(Coordinate::ZERO, Coordinate::new(-10.0, 0.0));
        assert_eq!(objects.times_within(10.0), Crossings::Never);
        assert!((objects.closest_approach().distance - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_grazing_pass_touches() {
        let objects = RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 10.0))
            .with_velocities(Coordinate::ZERO, Coordinate::new(-10.0, 0.0));
        match objects.times_within(10.0) {
            Crossings::Touching { time } => assert!((time - 10.0).abs() < 1e-9),
            other => panic!("expected a grazing contact, got {other:?}"),
        }
    }

    #[test]
    fn test_angle_between_objects() {
        let objects = RelativeObjects::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 10.0));
        assert!((objects.angle(0.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    fn coordinate(range: f64) -> impl Strategy<Value = Coordinate> {
        (-range..range, -range..range).prop_map(|(x, y)| Coordinate::new(x, y))
    }

    proptest! {
        #[test]
        fn closest_approach_is_a_future_minimum(
            a in coordinate(100.0),
            b in coordinate(100.0),
            va in coordinate(50.0),
            vb in coordinate(50.0),
            samples in proptest::collection::vec(0.0f64..20.0, 1..8),
        ) {
            let objects = RelativeObjects::new(a, b).with_velocities(va, vb);
            let approach = objects.closest_approach();
            prop_assert!(approach.time >= 0.0);
            prop_assert!(approach.distance <= objects.distance(0.0) + 1e-9);
            for t in samples {
                prop_assert!(approach.distance <= objects.distance(t) + 1e-9);
            }
        }

        #[test]
        fn first_time_within_lands_on_the_distance(
            a in coordinate(100.0),
            b in coordinate(100.0),
            va in coordinate(50.0),
            vb in coordinate(50.0),
            d in 0.1f64..50.0,
        ) {
            let objects = RelativeObjects::new(a, b).with_velocities(va, vb);
            prop_assume!((vb - va).length_squared() > 1e-3);

            let approach = objects.closest_approach();
            match objects.first_time_within(d) {
                Some(contact) => {
                    prop_assert!(contact.time >= 0.0);
                    let separation = contact.locations.0.distance_to(contact.locations.1);
                    prop_assert!((separation - d).abs() <= 1e-6 * d.max(1.0));
                }
                None => {
                    // Either never in range, or already in range at t = 0.
                    prop_assert!(approach.distance > d - 1e-9 || objects.distance(0.0) <= d + 1e-9);
                }
            }
            if approach.distance > d {
                prop_assert!(objects.first_time_within(d).is_none());
            }
        }
    }
}
