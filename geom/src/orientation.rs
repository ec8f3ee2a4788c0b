use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, Vec3};

/// A rotation in world space, as yaw/pitch/roll Euler angles in radians, applied in that order
/// around the Z, Y and X axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    yaw: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    pitch: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    roll: f64,
}

impl Orientation {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Orientation {
        if !yaw.is_finite() || !pitch.is_finite() || !roll.is_finite() {
            panic!("Bad Orientation {}, {}, {}", yaw, pitch, roll);
        }

        Orientation { yaw, pitch, roll }
    }

    pub fn yaw(self) -> f64 {
        self.yaw
    }

    pub fn pitch(self) -> f64 {
        self.pitch
    }

    pub fn roll(self) -> f64 {
        self.roll
    }

    /// Expresses a world-space vector in this rotated frame.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_roll, cos_roll) = self.roll.sin_cos();

        Vec3::new(
            cos_pitch * cos_yaw * v.x() + cos_pitch * sin_yaw * v.y() - sin_pitch * v.z(),
            (sin_roll * sin_pitch * cos_yaw - cos_roll * sin_yaw) * v.x()
                + (sin_roll * sin_pitch * sin_yaw + cos_roll * cos_yaw) * v.y()
                + sin_roll * cos_pitch * v.z(),
            (cos_roll * sin_pitch * cos_yaw + sin_roll * sin_yaw) * v.x()
                + (cos_roll * sin_pitch * sin_yaw - sin_roll * cos_yaw) * v.y()
                + cos_roll * cos_pitch * v.z(),
        )
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Orientation(yaw {}, pitch {}, roll {})",
            self.yaw, self.pitch, self.roll
        )
    }
}
