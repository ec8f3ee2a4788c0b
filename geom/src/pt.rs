use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64, Angle, Distance};

/// A point in world space, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt3D {
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    x: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    y: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    z: f64,
}

impl Pt3D {
    pub fn new(x: f64, y: f64, z: f64) -> Pt3D {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            panic!("Bad Pt3D {}, {}, {}", x, y, z);
        }

        Pt3D {
            x: trim_f64(x),
            y: trim_f64(y),
            z: trim_f64(z),
        }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn z(self) -> f64 {
        self.z
    }

    /// The Euclidean distance to another point.
    pub fn dist_to(self, to: Pt3D) -> Distance {
        Distance::meters(self.vec_to(to).magnitude())
    }

    /// The displacement from `self` to `to`.
    pub fn vec_to(self, to: Pt3D) -> Vec3 {
        Vec3::new(to.x - self.x, to.y - self.y, to.z - self.z)
    }
}

impl fmt::Display for Pt3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt3D({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A displacement in world space, in meters. Unlike `Pt3D`, a free vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    x: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    y: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Vec3 {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            panic!("Bad Vec3 {}, {}, {}", x, y, z);
        }

        Vec3 {
            x: trim_f64(x),
            y: trim_f64(y),
            z: trim_f64(z),
        }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn z(self) -> f64 {
        self.z
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// The unsigned angle between two vectors, in [0, 180] degrees. Degenerate vectors count as
    /// perpendicular.
    pub fn angle_between(self, other: Vec3) -> Angle {
        let magnitudes = self.magnitude() * other.magnitude();
        if magnitudes == 0.0 {
            return Angle::degrees(90.0);
        }
        Angle::radians((self.dot(other) / magnitudes).clamp(-1.0, 1.0).acos())
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Vec3({}, {}, {})", self.x, self.y, self.z)
    }
}
