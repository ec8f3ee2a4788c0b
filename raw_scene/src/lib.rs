//! The raw input schema for traffic scene snapshots: plain records as delivered by a simulator,
//! before any road topology is derived from them. All enums are closed sets; decoding a snapshot
//! rejects values outside them.

mod ids;
mod lane;
mod object;
mod sign;

pub use crate::ids::{BoundaryID, LaneID, ObjectID, SignID};
pub use crate::lane::{
    LaneBoundaryRecord, LanePairing, LaneRecord, LaneSubtype, LaneType, MarkingType,
};
pub use crate::object::{
    BrakeLightState, Dimension, GenericLightState, IndicatorState, LightState, MovingObjectRecord,
    MovingObjectType, StationaryObjectRecord,
};
pub use crate::sign::{TrafficSignRecord, TrafficSignType};

use serde::{Deserialize, Serialize};

/// Everything one snapshot of the scene reports. A snapshot with a non-empty `lanes` list
/// replaces the whole road topology; one with an empty list only updates objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub host_vehicle: ObjectID,
    pub lanes: Vec<LaneRecord>,
    pub boundaries: Vec<LaneBoundaryRecord>,
    pub signs: Vec<TrafficSignRecord>,
    pub moving_objects: Vec<MovingObjectRecord>,
    pub stationary_objects: Vec<StationaryObjectRecord>,
}
