//! Builders for the small synthetic scenes the test modules share.

use geom::Pt3D;
use raw_scene::{BoundaryID, LaneBoundaryRecord, LaneID, LaneRecord, LaneSubtype, LaneType, MarkingType};

use crate::Lane;

/// A driving lane along the given centerline, referencing one boundary per side.
pub fn lane_record(id: u64, subtype: LaneSubtype, centerline: Vec<Pt3D>) -> LaneRecord {
    LaneRecord {
        id: LaneID(id),
        lane_type: LaneType::Driving,
        subtype,
        centerline,
        centerline_is_driving_direction: true,
        left_adjacent: Vec::new(),
        right_adjacent: Vec::new(),
        left_boundaries: vec![BoundaryID(id * 10 + 1)],
        right_boundaries: vec![BoundaryID(id * 10 + 2)],
        pairings: Vec::new(),
    }
}

/// A straight lane from (x0, y) to (x1, y) at ground level.
pub fn straight(id: u64, subtype: LaneSubtype, x0: f64, x1: f64, y: f64) -> LaneRecord {
    lane_record(
        id,
        subtype,
        vec![Pt3D::new(x0, y, 0.0), Pt3D::new(x1, y, 0.0)],
    )
}

/// Boundary records for a lane record: the centerline shifted 2m to either side in y.
pub fn boundaries_for(record: &LaneRecord) -> Vec<LaneBoundaryRecord> {
    let offset = |dy: f64| {
        record
            .centerline
            .iter()
            .map(|pt| Pt3D::new(pt.x(), pt.y() + dy, pt.z()))
            .collect()
    };
    vec![
        LaneBoundaryRecord {
            id: record.left_boundaries[0],
            points: offset(2.0),
            marking: MarkingType::DashedLine,
        },
        LaneBoundaryRecord {
            id: record.right_boundaries[0],
            points: offset(-2.0),
            marking: MarkingType::SolidLine,
        },
    ]
}

pub fn build_lane(record: &LaneRecord) -> Lane {
    let boundaries = boundaries_for(record);
    Lane::new(record, vec![&boundaries[0]], vec![&boundaries[1]]).unwrap()
}

pub fn build_lanes(records: &[LaneRecord]) -> Vec<Lane> {
    records.iter().map(build_lane).collect()
}

/// Marks `left` and `right` as adjacent, from both sides.
pub fn link_sideways(left: &mut LaneRecord, right: &mut LaneRecord) {
    left.right_adjacent.push(right.id);
    right.left_adjacent.push(left.id);
}
