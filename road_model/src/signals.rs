use geom::{Angle, Distance, Projection, Vec3};
use raw_scene::TrafficSignRecord;

use crate::{LaneGraph, LaneGraphNode, RoadManager, RoadSignal};

/// Signs face against the driving direction: seen from the sign's own frame, the lane's
/// reverse direction at the projected segment must stay within this angle of straight ahead.
const SIGN_MAX_ANGLE: Angle = Angle::const_degrees(45.0);
/// Signs farther than this from every orientation-compatible centerline stay unassigned.
const MAX_SIGN_DISTANCE: Distance = Distance::const_meters(10.0);

/// Attaches each sign to the closest facing lane's road, recording the sign's longitudinal
/// position there. Unassignable signs are logged and dropped.
pub fn assign_signs_to_roads(
    graph: &LaneGraph,
    roads: &mut RoadManager,
    signs: &[TrafficSignRecord],
) {
    for sign in signs {
        let lane = match closest_facing_lane(graph, sign) {
            Some(node) => node.lane.id,
            None => {
                warn!("Could not assign {} to a lane", sign.id);
                continue;
            }
        };
        let road = match roads.lane_to_road().get(&lane) {
            Some(id) => *id,
            None => {
                warn!("Could not assign {} to a road", sign.id);
                continue;
            }
        };
        let s = match roads.road(road).object_road_s(graph, lane, sign.position) {
            Ok((s, _)) => s,
            Err(err) => {
                warn!("Could not place {} along {}: {}", sign.id, road, err);
                continue;
            }
        };
        roads.road_mut(road).signals.push(RoadSignal {
            road,
            s,
            lane,
            sign: sign.clone(),
        });
    }
}

fn closest_facing_lane<'a>(
    graph: &'a LaneGraph,
    sign: &TrafficSignRecord,
) -> Option<&'a LaneGraphNode> {
    let mut closest = None;
    let mut closest_distance = MAX_SIGN_DISTANCE;
    for node in graph.nodes() {
        let projection = node.lane.project(sign.position);
        if !faces_lane(node, sign, &projection) {
            continue;
        }
        let distance = sign.position.dist_to(projection.pt);
        if distance < closest_distance {
            closest = Some(node);
            closest_distance = distance;
        }
    }
    closest
}

fn faces_lane(node: &LaneGraphNode, sign: &TrafficSignRecord, projection: &Projection) -> bool {
    let (p1, p2) = node.lane.centerline().segment(projection.seg_idx);
    let reverse = sign.orientation.rotate(p2.vec_to(p1));
    reverse.angle_between(Vec3::new(1.0, 0.0, 0.0)) <= SIGN_MAX_ANGLE
}
