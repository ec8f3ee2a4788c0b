use geom::{Distance, Orientation, Pt3D, Vec3};
use serde::{Deserialize, Serialize};

use crate::{LaneID, ObjectID};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum MovingObjectType {
    Unknown,
    Other,
    Vehicle,
    Pedestrian,
    Animal,
}

/// A bounding box, expressed in the object's own frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub length: Distance,
    pub width: Distance,
    pub height: Distance,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum IndicatorState {
    Unknown,
    Other,
    Off,
    Left,
    Right,
    Warning,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BrakeLightState {
    Unknown,
    Other,
    Off,
    Normal,
    Strong,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GenericLightState {
    Unknown,
    Other,
    Off,
    On,
    Flashing,
}

/// The externally visible lamps of a vehicle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub indicator: IndicatorState,
    pub brake: BrakeLightState,
    pub head_light: GenericLightState,
    pub high_beam: GenericLightState,
}

impl Default for LightState {
    fn default() -> LightState {
        LightState {
            indicator: IndicatorState::Unknown,
            brake: BrakeLightState::Unknown,
            head_light: GenericLightState::Unknown,
            high_beam: GenericLightState::Unknown,
        }
    }
}

/// One moving object as reported by a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovingObjectRecord {
    pub id: ObjectID,
    pub object_type: MovingObjectType,
    pub dimension: Dimension,
    /// The center of the bounding box, in world space.
    pub position: Pt3D,
    pub orientation: Orientation,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Lanes the object overlaps, most plausible first. The first entry drives all road
    /// attribution.
    pub assigned_lanes: Vec<LaneID>,
    pub lights: LightState,
}

/// One stationary obstacle as reported by a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationaryObjectRecord {
    pub id: ObjectID,
    pub dimension: Dimension,
    pub position: Pt3D,
}
