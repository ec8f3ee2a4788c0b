use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Orientation, Pt3D, Speed, Vec3};
use raw_scene::{
    Dimension, LaneID, LaneSubtype, LaneType, LightState, MarkingType, MovingObjectRecord,
    MovingObjectType, ObjectID, SceneSnapshot,
};

use crate::speedlimit::calculate_speed_limit;
use crate::{
    LaneGraph, LaneGraphNode, NeighborLanes, RampDistances, Road, RoadID, RoadNetwork, RoadSignal,
};

/// Everything the road model knows about one object's place on its road, measured at the
/// object's projection onto its lane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadState {
    /// Signed curvature of the lane centerline, in 1/m.
    pub curvature: f64,
    /// Rate of curvature change along the centerline, in 1/m^2.
    pub curvature_change: f64,
    pub lane_width: Distance,
    /// Lateral position within the lane: 0 at the left boundary, 1 at the right.
    pub lane_position: f64,
    pub distance_to_lane_end: NeighborLanes<Distance>,
    pub distance_to_ramp: RampDistances,
    pub distance_to_next_exit: Option<Distance>,
    pub lane_types: NeighborLanes<(LaneType, LaneSubtype)>,
    pub left_marking: MarkingType,
    pub right_marking: MarkingType,
    /// Elevation of the centerline at the projection.
    pub road_z: Distance,
    /// The lane's local heading at the projection.
    pub road_angle: Angle,
    /// Signed shortest rotation from the road angle to the object's yaw.
    pub heading_relative_to_road: Angle,
    pub on_highway: bool,
    pub on_junction: bool,
    pub same_road_as_ego: bool,
    pub speed_limit: Option<Speed>,
    /// All signs assigned to this road, in assignment order.
    pub signals: Vec<RoadSignal>,
}

impl RoadState {
    /// Bundles the road-relative measures for an object at `pos` on `node`'s lane. `road_s` is
    /// the object's longitudinal position on `road`, and `ego_road` the ego's road if it has
    /// one; a roadless ego counts every road as its own.
    pub fn new(
        graph: &LaneGraph,
        road: &Road,
        node: &LaneGraphNode,
        pos: Pt3D,
        heading: Angle,
        road_s: Distance,
        ego_road: Option<RoadID>,
    ) -> Option<RoadState> {
        let lane = &node.lane;
        let projection = lane.project(pos);
        let (left_pt, right_pt) = lane.boundary_points(pos);
        let (left_marking, right_marking) = lane.boundary_markings(pos);
        let lane_width = left_pt.dist_to(right_pt);
        let road_angle = lane.centerline().segment_angle(projection.seg_idx);
        // Speed signs posted on exit lanes only concern exiting traffic; skip them unless the
        // object drives the exit itself.
        let ignore_exit_signs = road.on_highway && lane.subtype != LaneSubtype::Exit;

        Some(RoadState {
            curvature: lane.curvature_at(&projection),
            curvature_change: lane.curvature_change_at(&projection),
            lane_width,
            lane_position: pos.dist_to(left_pt).safe_percent(lane_width),
            distance_to_lane_end: graph.distance_to_lane_end(lane.id, pos)?,
            distance_to_ramp: graph.distance_to_ramp(lane.id, pos)?,
            distance_to_next_exit: graph.distance_to_next_exit(lane.id, pos),
            lane_types: graph.neighbor_types(lane.id)?,
            left_marking,
            right_marking,
            road_z: Distance::meters(projection.pt.z()),
            road_angle,
            heading_relative_to_road: road_angle.shortest_rotation_towards(heading),
            on_highway: road.on_highway,
            on_junction: lane.lane_type == LaneType::Intersection,
            same_road_as_ego: ego_road.map_or(true, |ego| road.id == ego),
            speed_limit: calculate_speed_limit(road, graph, road_s, ignore_exit_signs),
            signals: road.signals.clone(),
        })
    }
}

/// A moving object from a snapshot, annotated with its road attribution. The kinematic fields
/// restate the record; the road fields are all `None` when the object's first assigned lane is
/// unknown or roadless.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovingObjectState {
    pub id: ObjectID,
    pub object_type: MovingObjectType,
    pub dimension: Dimension,
    pub position: Pt3D,
    pub orientation: Orientation,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Magnitude of the velocity.
    pub speed: Speed,
    pub assigned_lanes: Vec<LaneID>,
    pub lights: LightState,
    pub road_id: Option<RoadID>,
    /// The object's longitudinal position and the road's total length.
    pub road_s: Option<(Distance, Distance)>,
    pub road_state: Option<RoadState>,
}

impl MovingObjectState {
    pub fn new(
        record: &MovingObjectRecord,
        network: &RoadNetwork,
        ego_road: Option<RoadID>,
    ) -> MovingObjectState {
        let mut state = MovingObjectState {
            id: record.id,
            object_type: record.object_type,
            dimension: record.dimension,
            position: record.position,
            orientation: record.orientation,
            velocity: record.velocity,
            acceleration: record.acceleration,
            speed: Speed::meters_per_second(record.velocity.magnitude()),
            assigned_lanes: record.assigned_lanes.clone(),
            lights: record.lights,
            road_id: None,
            road_s: None,
            road_state: None,
        };
        let lane = match record.assigned_lanes.first() {
            Some(id) => *id,
            None => {
                return state;
            }
        };
        let node = match network.graph().get(lane) {
            Some(node) => node,
            None => {
                return state;
            }
        };
        let road = match network.roads().road_for(lane) {
            Some(road) => road,
            None => {
                return state;
            }
        };
        let (s, total) = match road.object_road_s(network.graph(), lane, record.position) {
            Ok(pair) => pair,
            Err(err) => {
                warn!("No road position for {}: {}", record.id, err);
                return state;
            }
        };
        state.road_id = Some(road.id);
        state.road_s = Some((s, total));
        state.road_state = RoadState::new(
            network.graph(),
            road,
            node,
            record.position,
            Angle::radians(record.orientation.yaw()),
            s,
            ego_road,
        );
        state
    }
}

/// A stationary obstacle, passed through from the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationaryObstacle {
    pub id: ObjectID,
    pub dimension: Dimension,
    pub position: Pt3D,
}

/// One snapshot, attributed against a road network. The ego comes first in `moving_objects`;
/// all other objects are measured relative to the ego's road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub host_vehicle: ObjectID,
    pub moving_objects: Vec<MovingObjectState>,
    pub stationary_obstacles: Vec<StationaryObstacle>,
}

impl SceneState {
    pub fn new(snapshot: &SceneSnapshot, network: &RoadNetwork) -> Result<SceneState> {
        let ego_record = snapshot
            .moving_objects
            .iter()
            .find(|record| record.id == snapshot.host_vehicle)
            .ok_or_else(|| {
                anyhow!(
                    "host vehicle {} is missing from the snapshot",
                    snapshot.host_vehicle
                )
            })?;
        let ego = MovingObjectState::new(ego_record, network, None);
        let ego_road = ego.road_id;

        let mut moving_objects = vec![ego];
        for record in &snapshot.moving_objects {
            if record.id == snapshot.host_vehicle {
                continue;
            }
            moving_objects.push(MovingObjectState::new(record, network, ego_road));
        }
        let stationary_obstacles = snapshot
            .stationary_objects
            .iter()
            .map(|record| StationaryObstacle {
                id: record.id,
                dimension: record.dimension,
                position: record.position,
            })
            .collect();
        Ok(SceneState {
            host_vehicle: snapshot.host_vehicle,
            moving_objects,
            stationary_obstacles,
        })
    }
}

#[cfg(test)]
mod tests {
    use raw_scene::{SignID, TrafficSignRecord, TrafficSignType};

    use crate::{testing, RoadManager};

    use super::*;

    fn speed_sign(s: f64, lane: u64, km_per_hour: f64) -> RoadSignal {
        RoadSignal {
            road: RoadID(0),
            s: Distance::meters(s),
            lane: LaneID(lane),
            sign: TrafficSignRecord {
                id: SignID(1),
                sign_type: TrafficSignType::SpeedLimitBegin,
                value: Some(km_per_hour),
                position: Pt3D::new(s, 0.0, 0.0),
                orientation: Orientation::default(),
            },
        }
    }

    #[test]
    fn road_state_measures_the_lane_locally() {
        let mut right = testing::straight(1, LaneSubtype::Normal, 0.0, 100.0, 0.0);
        let mut left = testing::straight(2, LaneSubtype::Normal, 0.0, 100.0, 3.5);
        testing::link_sideways(&mut left, &mut right);
        let graph = LaneGraph::new(testing::build_lanes(&[right, left])).unwrap();
        let mut roads = RoadManager::build(&graph);
        roads.road_mut(RoadID(0)).signals = vec![speed_sign(10.0, 1, 50.0)];
        let road = &roads.roads()[0];

        let node = graph.get(LaneID(1)).unwrap();
        let pos = Pt3D::new(40.0, 0.5, 0.0);
        let (s, _) = road.object_road_s(&graph, LaneID(1), pos).unwrap();
        let state = RoadState::new(
            &graph,
            road,
            node,
            pos,
            Angle::radians(0.1),
            s,
            Some(RoadID(0)),
        )
        .unwrap();

        // Straight lane at ground level.
        assert_eq!(state.curvature, 0.0);
        assert_eq!(state.curvature_change, 0.0);
        assert_eq!(state.road_z, Distance::ZERO);
        assert_eq!(state.road_angle, Angle::ZERO);
        assert_eq!(state.heading_relative_to_road, Angle::radians(0.1));

        // Boundaries sit 2m to either side; the object rides 0.5m left of center.
        assert_eq!(state.lane_width, Distance::meters(4.0));
        assert_eq!(state.lane_position, 0.375);
        assert_eq!(state.left_marking, MarkingType::DashedLine);
        assert_eq!(state.right_marking, MarkingType::SolidLine);

        assert_eq!(state.distance_to_lane_end.current, Distance::meters(60.0));
        assert_eq!(state.distance_to_lane_end.left, Some(Distance::meters(60.0)));
        assert_eq!(state.distance_to_lane_end.right, None);
        assert_eq!(state.distance_to_next_exit, None);
        assert_eq!(state.distance_to_ramp.current, None);

        assert_eq!(
            state.lane_types.current,
            (LaneType::Driving, LaneSubtype::Normal)
        );
        assert_eq!(
            state.lane_types.left,
            Some((LaneType::Driving, LaneSubtype::Normal))
        );
        assert_eq!(state.lane_types.right, None);

        assert!(!state.on_highway);
        assert!(!state.on_junction);
        assert!(state.same_road_as_ego);
        assert_eq!(state.speed_limit, Some(Speed::km_per_hour(50.0)));
        assert_eq!(state.signals.len(), 1);
    }

    #[test]
    fn objects_on_other_roads_are_flagged() {
        let a = testing::straight(1, LaneSubtype::Normal, 0.0, 100.0, 0.0);
        let graph = LaneGraph::new(testing::build_lanes(&[a])).unwrap();
        let roads = RoadManager::build(&graph);
        let road = &roads.roads()[0];
        let node = graph.get(LaneID(1)).unwrap();
        let pos = Pt3D::new(10.0, 0.0, 0.0);
        let (s, _) = road.object_road_s(&graph, LaneID(1), pos).unwrap();

        let other = RoadState::new(&graph, road, node, pos, Angle::ZERO, s, Some(RoadID(7)))
            .unwrap();
        assert!(!other.same_road_as_ego);

        // A roadless ego counts every road as its own.
        let roadless = RoadState::new(&graph, road, node, pos, Angle::ZERO, s, None).unwrap();
        assert!(roadless.same_road_as_ego);
    }

    #[test]
    fn junction_lanes_flag_the_state() {
        let mut record = testing::straight(1, LaneSubtype::Normal, 0.0, 50.0, 0.0);
        record.lane_type = LaneType::Intersection;
        let graph = LaneGraph::new(testing::build_lanes(&[record])).unwrap();
        let roads = RoadManager::build(&graph);
        let road = &roads.roads()[0];
        let node = graph.get(LaneID(1)).unwrap();
        let pos = Pt3D::new(10.0, 0.0, 0.0);
        let (s, _) = road.object_road_s(&graph, LaneID(1), pos).unwrap();

        let state = RoadState::new(&graph, road, node, pos, Angle::ZERO, s, None).unwrap();
        assert!(state.on_junction);
    }

    #[test]
    fn road_state_serializes_cleanly() {
        let a = testing::straight(1, LaneSubtype::Normal, 0.0, 100.0, 0.0);
        let graph = LaneGraph::new(testing::build_lanes(&[a])).unwrap();
        let roads = RoadManager::build(&graph);
        let road = &roads.roads()[0];
        let node = graph.get(LaneID(1)).unwrap();
        let pos = Pt3D::new(25.0, 0.0, 0.0);
        let (s, _) = road.object_road_s(&graph, LaneID(1), pos).unwrap();
        let state = RoadState::new(&graph, road, node, pos, Angle::ZERO, s, None).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let back: RoadState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
