use geom::Pt3D;
use serde::{Deserialize, Serialize};

use crate::{BoundaryID, LaneID};

/// The coarse classification of a lane.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum LaneType {
    Unknown,
    Other,
    Driving,
    Nondriving,
    Intersection,
}

impl LaneType {
    /// Vehicles may only occupy driving lanes and intersection lanes.
    pub fn allows_driving(self) -> bool {
        matches!(self, LaneType::Driving | LaneType::Intersection)
    }
}

/// The fine classification of a lane. Ramp-related subtypes steer road merging and the ramp
/// distance queries.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum LaneSubtype {
    Unknown,
    Other,
    Normal,
    Biking,
    Sidewalk,
    Parking,
    Stopping,
    Restricted,
    Border,
    Shoulder,
    Exit,
    Entry,
    Onramp,
    Offramp,
    Connectingramp,
}

impl LaneSubtype {
    pub fn is_ramp(self) -> bool {
        matches!(self, LaneSubtype::Offramp | LaneSubtype::Connectingramp)
    }
}

/// The painted (or physical) marking along a lane boundary.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum MarkingType {
    Unknown,
    Other,
    NoLine,
    SolidLine,
    DashedLine,
    BottsDots,
    RoadEdge,
    GuardRail,
    Curb,
    Barrier,
}

/// A predecessor/successor hint declared by the scene producer. The lane graph derives its own
/// links from endpoint proximity, but the hints are part of the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePairing {
    pub antecessor: Option<LaneID>,
    pub successor: Option<LaneID>,
}

/// One lane as reported by a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneRecord {
    pub id: LaneID,
    pub lane_type: LaneType,
    pub subtype: LaneSubtype,
    /// The centerline points, as stored by the producer. May run against driving direction.
    pub centerline: Vec<Pt3D>,
    /// True if `centerline` is ordered in driving direction.
    pub centerline_is_driving_direction: bool,
    pub left_adjacent: Vec<LaneID>,
    pub right_adjacent: Vec<LaneID>,
    pub left_boundaries: Vec<BoundaryID>,
    pub right_boundaries: Vec<BoundaryID>,
    pub pairings: Vec<LanePairing>,
}

/// One lane boundary as reported by a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneBoundaryRecord {
    pub id: BoundaryID,
    pub points: Vec<Pt3D>,
    pub marking: MarkingType,
}
