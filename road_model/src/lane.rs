use anyhow::Result;
use geom::{Distance, PolyLine, Projection, Pt3D};
use raw_scene::{LaneBoundaryRecord, LaneID, LaneRecord, LaneSubtype, LaneType, MarkingType};
use serde::{Deserialize, Serialize};

/// One piece of a lane's edge, with the marking painted on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneBoundary {
    pub line: PolyLine,
    pub marking: MarkingType,
}

/// A lane from one snapshot, with its centerline oriented into the driving direction and its
/// boundary references resolved to geometry. Everything derived from the centerline (length,
/// curvature) is computed once here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneID,
    pub lane_type: LaneType,
    pub subtype: LaneSubtype,
    /// Neighbors as declared by the snapshot; the graph resolves them to nodes.
    pub left_adjacent: Vec<LaneID>,
    pub right_adjacent: Vec<LaneID>,
    centerline: PolyLine,
    /// Menger curvature per centerline point. The endpoints are always 0.
    curvature: Vec<f64>,
    /// Per segment, the curvature delta across it divided by its length.
    curvature_change: Vec<f64>,
    left_boundaries: Vec<LaneBoundary>,
    right_boundaries: Vec<LaneBoundary>,
}

impl Lane {
    /// Builds a lane from a record and the boundary records its declared left/right sides
    /// reference, in declaration order. When the centerline is stored against the driving
    /// direction, it's reversed and the two sides swap roles. Degenerate geometry (too few
    /// distinct centerline points, no usable boundary on a side) is an error; the caller
    /// decides whether that skips the lane.
    pub fn new(
        record: &LaneRecord,
        declared_left: Vec<&LaneBoundaryRecord>,
        declared_right: Vec<&LaneBoundaryRecord>,
    ) -> Result<Lane> {
        let mut pts = record.centerline.clone();
        if !record.centerline_is_driving_direction {
            pts.reverse();
        }
        let centerline = PolyLine::deduping_new(pts)
            .map_err(|err| anyhow!("{} has a degenerate centerline: {}", record.id, err))?;

        let (left_records, right_records) = if record.centerline_is_driving_direction {
            (declared_left, declared_right)
        } else {
            (declared_right, declared_left)
        };
        let left_boundaries = build_side(left_records)
            .map_err(|err| anyhow!("{} has no usable left boundary: {}", record.id, err))?;
        let right_boundaries = build_side(right_records)
            .map_err(|err| anyhow!("{} has no usable right boundary: {}", record.id, err))?;

        let curvature = centerline.curvatures();
        let curvature_change = (0..centerline.points().len() - 1)
            .map(|i| {
                (curvature[i + 1] - curvature[i]) / centerline.segment_length(i).inner_meters()
            })
            .collect();

        Ok(Lane {
            id: record.id,
            lane_type: record.lane_type,
            subtype: record.subtype,
            left_adjacent: record.left_adjacent.clone(),
            right_adjacent: record.right_adjacent.clone(),
            centerline,
            curvature,
            curvature_change,
            left_boundaries,
            right_boundaries,
        })
    }

    pub fn centerline(&self) -> &PolyLine {
        &self.centerline
    }

    pub fn total_length(&self) -> Distance {
        self.centerline.length()
    }

    pub fn project(&self, pos: Pt3D) -> Projection {
        self.centerline.project(pos)
    }

    /// Distance from the projected position to the end of this lane alone.
    pub fn dist_to_end(&self, projection: &Projection) -> Distance {
        self.centerline.dist_remaining(projection)
    }

    /// Curvature at a projected position, interpolated between the containing segment's
    /// endpoint curvatures.
    pub fn curvature_at(&self, projection: &Projection) -> f64 {
        let i = projection.seg_idx;
        self.curvature[i] * (1.0 - projection.progress) + self.curvature[i + 1] * projection.progress
    }

    pub fn curvature_change_at(&self, projection: &Projection) -> f64 {
        self.curvature_change[projection.seg_idx]
    }

    /// The nearest point on each side's boundary. The two sides are projected independently, so
    /// the points need not be at the same longitudinal position.
    pub fn boundary_points(&self, pos: Pt3D) -> (Pt3D, Pt3D) {
        (
            nearest_on_side(&self.left_boundaries, pos).0,
            nearest_on_side(&self.right_boundaries, pos).0,
        )
    }

    /// The marking of the boundary piece nearest to `pos` on each side.
    pub fn boundary_markings(&self, pos: Pt3D) -> (MarkingType, MarkingType) {
        (
            nearest_on_side(&self.left_boundaries, pos).1,
            nearest_on_side(&self.right_boundaries, pos).1,
        )
    }
}

fn build_side(records: Vec<&LaneBoundaryRecord>) -> Result<Vec<LaneBoundary>> {
    let mut side = Vec::new();
    for record in records {
        match PolyLine::deduping_new(record.points.clone()) {
            Ok(line) => side.push(LaneBoundary {
                line,
                marking: record.marking,
            }),
            Err(err) => {
                debug!("Dropping degenerate boundary piece {}: {}", record.id, err);
            }
        }
    }
    if side.is_empty() {
        bail!("no boundary pieces with at least two distinct points");
    }
    Ok(side)
}

// Sides are non-empty per Lane::new.
fn nearest_on_side(side: &[LaneBoundary], pos: Pt3D) -> (Pt3D, MarkingType) {
    side.iter()
        .map(|boundary| {
            let pt = boundary.line.project(pos).pt;
            (pos.dist_to(pt), pt, boundary.marking)
        })
        .min_by_key(|(dist, _, _)| *dist)
        .map(|(_, pt, marking)| (pt, marking))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use geom::Pt3D;
    use raw_scene::{BoundaryID, LaneBoundaryRecord, LaneID, MarkingType};

    use crate::testing;

    use super::*;

    #[test]
    fn reversed_centerline_swaps_boundary_roles() {
        let mut record = testing::straight(1, LaneSubtype::Normal, 0.0, 10.0, 0.0);
        record.centerline = vec![Pt3D::new(10.0, 0.0, 0.0), Pt3D::new(0.0, 0.0, 0.0)];
        record.centerline_is_driving_direction = false;
        let boundaries = testing::boundaries_for(&record);
        let lane = Lane::new(&record, vec![&boundaries[0]], vec![&boundaries[1]]).unwrap();

        // Driving direction is +x again, and the declared sides swapped around the lane.
        assert_eq!(lane.centerline().first_pt(), Pt3D::new(0.0, 0.0, 0.0));
        assert_eq!(lane.centerline().last_pt(), Pt3D::new(10.0, 0.0, 0.0));
        let (left, right) = lane.boundary_markings(Pt3D::new(5.0, 0.0, 0.0));
        assert_eq!(left, MarkingType::SolidLine);
        assert_eq!(right, MarkingType::DashedLine);
    }

    #[test]
    fn single_point_centerline_is_rejected() {
        let mut record = testing::straight(2, LaneSubtype::Normal, 0.0, 10.0, 0.0);
        record.centerline = vec![Pt3D::new(0.0, 0.0, 0.0)];
        let boundaries = testing::boundaries_for(&record);
        assert!(Lane::new(&record, vec![&boundaries[0]], vec![&boundaries[1]]).is_err());
    }

    #[test]
    fn missing_boundary_side_is_rejected() {
        let record = testing::straight(3, LaneSubtype::Normal, 0.0, 10.0, 0.0);
        let boundaries = testing::boundaries_for(&record);
        assert!(Lane::new(&record, vec![], vec![&boundaries[1]]).is_err());

        // A side whose only piece is a single point is as good as missing.
        let dot = LaneBoundaryRecord {
            id: BoundaryID(999),
            points: vec![Pt3D::new(0.0, 2.0, 0.0)],
            marking: MarkingType::SolidLine,
        };
        assert!(Lane::new(&record, vec![&dot], vec![&boundaries[1]]).is_err());
    }

    #[test]
    fn curvature_arrays_line_up_with_the_centerline() {
        let record = testing::lane_record(
            4,
            LaneSubtype::Normal,
            vec![
                Pt3D::new(0.0, 0.0, 0.0),
                Pt3D::new(10.0, 0.0, 0.0),
                Pt3D::new(20.0, 5.0, 0.0),
                Pt3D::new(30.0, 5.0, 0.0),
            ],
        );
        let lane = testing::build_lane(&record);

        // One curvature per point, one change per segment.
        assert_eq!(lane.curvature.len(), 4);
        assert_eq!(lane.curvature_change.len(), 3);
        assert_eq!(lane.curvature[0], 0.0);
        assert_eq!(lane.curvature[3], 0.0);
        assert!(lane.curvature[1] > 0.0);

        // At the very start of the first segment, the interpolation is the first point's value.
        let projection = lane.project(Pt3D::new(0.0, 0.0, 0.0));
        assert_eq!(lane.curvature_at(&projection), 0.0);
        assert_eq!(
            lane.curvature_change_at(&projection),
            lane.curvature[1] / 10.0
        );
    }

    #[test]
    fn boundary_queries_pick_the_nearest_piece() {
        let mut record = testing::straight(5, LaneSubtype::Normal, 0.0, 20.0, 0.0);
        record.left_boundaries = vec![BoundaryID(51), BoundaryID(52)];
        let left_near = LaneBoundaryRecord {
            id: BoundaryID(51),
            points: vec![Pt3D::new(0.0, 2.0, 0.0), Pt3D::new(10.0, 2.0, 0.0)],
            marking: MarkingType::DashedLine,
        };
        let left_far = LaneBoundaryRecord {
            id: BoundaryID(52),
            points: vec![Pt3D::new(10.0, 2.0, 0.0), Pt3D::new(20.0, 2.0, 0.0)],
            marking: MarkingType::SolidLine,
        };
        let right = LaneBoundaryRecord {
            id: record.right_boundaries[0],
            points: vec![Pt3D::new(0.0, -2.0, 0.0), Pt3D::new(20.0, -2.0, 0.0)],
            marking: MarkingType::RoadEdge,
        };
        let lane = Lane::new(&record, vec![&left_near, &left_far], vec![&right]).unwrap();

        let (left_pt, right_pt) = lane.boundary_points(Pt3D::new(4.0, 0.0, 0.0));
        assert_eq!(left_pt, Pt3D::new(4.0, 2.0, 0.0));
        assert_eq!(right_pt, Pt3D::new(4.0, -2.0, 0.0));
        assert_eq!(
            lane.boundary_markings(Pt3D::new(4.0, 0.0, 0.0)),
            (MarkingType::DashedLine, MarkingType::RoadEdge)
        );
        assert_eq!(
            lane.boundary_markings(Pt3D::new(16.0, 0.0, 0.0)),
            (MarkingType::SolidLine, MarkingType::RoadEdge)
        );
    }

    #[test]
    fn lane_id_formatting() {
        assert_eq!(LaneID(42).to_string(), "Lane #42");
    }
}
