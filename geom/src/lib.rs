//! Geometric primitives for reconstructing road topology from scene snapshots: scalar newtypes
//! with trimmed precision, 3D points and vectors, rotations, and polylines with projection and
//! curvature math.

#[macro_use]
extern crate anyhow;

mod angle;
mod distance;
mod orientation;
mod polyline;
mod pt;
mod speed;

pub use crate::angle::Angle;
pub use crate::distance::Distance;
pub use crate::orientation::Orientation;
pub use crate::polyline::{PolyLine, Projection};
pub use crate::pt::{Pt3D, Vec3};
pub use crate::speed::Speed;

use serde::{Deserialize, Deserializer, Serializer};

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading).
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn serialize_f64<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    if x.fract() == 0.0 {
        s.serialize_i64(*x as i64)
    } else {
        s.serialize_f64(*x)
    }
}

fn deserialize_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    f64::deserialize(d)
}

#[cfg(test)]
mod tests {
    use crate::{Angle, Distance};

    #[test]
    fn serialization_is_idempotent() {
        // Whole numbers encode as plain integers.
        assert_eq!("5", serde_json::to_string(&Distance::meters(5.0)).unwrap());
        assert_eq!("-90", serde_json::to_string(&Angle::degrees(-90.0)).unwrap());

        // Everything else keeps exactly the trimmed precision through a round trip.
        let dist = Distance::meters(1.23456);
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!("1.2346", json);
        assert_eq!(dist, serde_json::from_str::<Distance>(&json).unwrap());

        let angle: Angle = serde_json::from_str("-90").unwrap();
        assert_eq!(Angle::degrees(-90.0), angle);
    }
}
