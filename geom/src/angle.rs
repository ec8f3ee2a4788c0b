use std::{cmp, fmt};

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64};

/// An angle, stored in degrees. Can be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")] f64,
);

// By construction, Angle is a finite f64 with trimmed precision.
impl Eq for Angle {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Angle {
    fn cmp(&self, other: &Angle) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Angle {
    pub const ZERO: Angle = Angle::const_degrees(0.0);

    /// Creates an angle in degrees.
    pub fn degrees(value: f64) -> Angle {
        if !value.is_finite() {
            panic!("Bad Angle {}", value);
        }

        Angle(trim_f64(value))
    }

    // TODO Can't panic inside a const fn, seemingly. Don't pass in anything bad!
    pub const fn const_degrees(value: f64) -> Angle {
        Angle(value)
    }

    /// Creates an angle in radians.
    pub fn radians(value: f64) -> Angle {
        Angle::degrees(value.to_degrees())
    }

    /// Returns the angle in [0, 360) degrees.
    pub fn normalized_degrees(self) -> f64 {
        self.0.rem_euclid(360.0)
    }

    /// Returns the angle in [0, 2pi) radians.
    pub fn normalized_radians(self) -> f64 {
        self.normalized_degrees().to_radians()
    }

    /// The signed rotation from `self` to `other`, normalized to [-180, 180) degrees. Negative
    /// means `other` lies clockwise of `self`.
    pub fn shortest_rotation_towards(self, other: Angle) -> Angle {
        Angle::degrees((other.0 - self.0 + 180.0).rem_euclid(360.0) - 180.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(90.0, Angle::degrees(-270.0).normalized_degrees());
        assert_eq!(0.0, Angle::degrees(720.0).normalized_degrees());

        assert_eq!(90.0_f64.to_radians(), Angle::degrees(-270.0).normalized_radians());
        assert_eq!(0.0, Angle::degrees(720.0).normalized_radians());
    }

    #[test]
    fn shortest_rotation() {
        let east = Angle::degrees(0.0);
        let north = Angle::degrees(90.0);
        assert_eq!(north, east.shortest_rotation_towards(north));
        assert_eq!(Angle::degrees(-90.0), north.shortest_rotation_towards(east));

        // Wrapping around the back side takes the short way.
        let almost_full = Angle::degrees(350.0);
        assert_eq!(
            Angle::degrees(-10.0),
            east.shortest_rotation_towards(almost_full)
        );
        assert_eq!(
            Angle::degrees(20.0),
            almost_full.shortest_rotation_towards(Angle::degrees(10.0))
        );
    }
}
