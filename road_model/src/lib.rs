//! road_model reconstructs road topology from per-snapshot lane records: it links lanes into a
//! graph, merges them into roads with a longitudinal coordinate, attaches traffic signs, and
//! answers spatial queries (curvature, lane position, distances to lane ends, exits and ramps,
//! speed limits) about the objects moving through the scene.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod extractor;
mod lane;
mod lanegraph;
mod network;
mod road;
mod signals;
mod speedlimit;
mod state;
#[cfg(test)]
mod testing;

pub use crate::extractor::Extractor;
pub use crate::lane::{Lane, LaneBoundary};
pub use crate::lanegraph::{
    LaneGraph, LaneGraphNode, NeighborLanes, RampDistances, SUCCESSOR_MAX_DISTANCE,
};
pub use crate::network::RoadNetwork;
pub use crate::road::{Road, RoadID, RoadManager, RoadSignal};
pub use crate::signals::assign_signs_to_roads;
pub use crate::speedlimit::calculate_speed_limit;
pub use crate::state::{MovingObjectState, RoadState, SceneState, StationaryObstacle};
