use geom::{Orientation, Pt3D};
use serde::{Deserialize, Serialize};

use crate::SignID;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum TrafficSignType {
    Unknown,
    Other,
    SpeedLimitBegin,
    SpeedLimitEnd,
    SpeedZoneBegin,
    SpeedZoneEnd,
    Stop,
    GiveWay,
}

impl TrafficSignType {
    /// Signs that participate in speed-limit derivation.
    pub fn affects_speed_limit(self) -> bool {
        matches!(
            self,
            TrafficSignType::SpeedLimitBegin
                | TrafficSignType::SpeedLimitEnd
                | TrafficSignType::SpeedZoneBegin
                | TrafficSignType::SpeedZoneEnd
        )
    }

    /// Signs that clear the current limit rather than posting one.
    pub fn ends_limit(self) -> bool {
        matches!(
            self,
            TrafficSignType::SpeedLimitEnd | TrafficSignType::SpeedZoneEnd
        )
    }
}

/// One traffic sign as reported by a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficSignRecord {
    pub id: SignID,
    pub sign_type: TrafficSignType,
    /// The posted value, if the sign carries one. Speed signs post km/h.
    pub value: Option<f64>,
    pub position: Pt3D,
    pub orientation: Orientation,
}
