use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Pt3D};
use raw_scene::{BoundaryID, LaneBoundaryRecord, LaneID, LaneRecord, TrafficSignRecord};

use crate::{assign_signs_to_roads, Lane, LaneGraph, RoadID, RoadManager, RoadState};

/// One snapshot's lane records, fully digested: the lane graph, the merged roads and the signs
/// attached to them. Never mutated after `build`; the extractor swaps whole networks instead.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    graph: LaneGraph,
    roads: RoadManager,
}

impl RoadNetwork {
    /// A network with no lanes. Every query misses.
    pub fn empty() -> RoadNetwork {
        RoadNetwork::default()
    }

    /// Builds the graph, merges roads and attaches signs, in that order. Structural problems
    /// (conflicting adjacency or successor links, dangling boundary references) fail the whole
    /// build; a lane with broken geometry is skipped on its own.
    pub fn build(
        lanes: &[LaneRecord],
        boundaries: &[LaneBoundaryRecord],
        signs: &[TrafficSignRecord],
    ) -> Result<RoadNetwork> {
        let by_id: BTreeMap<BoundaryID, &LaneBoundaryRecord> =
            boundaries.iter().map(|b| (b.id, b)).collect();
        // Lanes reported twice keep the last record, like boundaries above.
        let mut built: BTreeMap<LaneID, Lane> = BTreeMap::new();
        for record in lanes {
            let left = resolve(record, &record.left_boundaries, &by_id)?;
            let right = resolve(record, &record.right_boundaries, &by_id)?;
            match Lane::new(record, left, right) {
                Ok(lane) => {
                    built.insert(lane.id, lane);
                }
                Err(err) => {
                    warn!("Skipping {}: {}", record.id, err);
                }
            }
        }
        let graph = LaneGraph::new(built.into_values().collect())?;
        let mut roads = RoadManager::build(&graph);
        assign_signs_to_roads(&graph, &mut roads, signs);
        info!(
            "Built road network: {} lanes merged into {} roads",
            graph.len(),
            roads.roads().len()
        );
        Ok(RoadNetwork { graph, roads })
    }

    pub fn graph(&self) -> &LaneGraph {
        &self.graph
    }

    pub fn roads(&self) -> &RoadManager {
        &self.roads
    }

    pub fn road_id_for(&self, lane: LaneID) -> Option<RoadID> {
        self.roads.lane_to_road().get(&lane).copied()
    }

    /// The longitudinal position of `pos` on `lane`'s road and that road's total length.
    pub fn road_s_for(&self, lane: LaneID, pos: Pt3D) -> Option<(Distance, Distance)> {
        let road = self.roads.road_for(lane)?;
        road.object_road_s(&self.graph, lane, pos).ok()
    }

    /// The full road-state bundle for an object at `pos` on `lane`, heading `heading`.
    pub fn road_state_for(
        &self,
        lane: LaneID,
        pos: Pt3D,
        heading: Angle,
        ego_road: Option<RoadID>,
    ) -> Option<RoadState> {
        let node = self.graph.get(lane)?;
        let road = self.roads.road_for(lane)?;
        let (s, _) = road.object_road_s(&self.graph, lane, pos).ok()?;
        RoadState::new(&self.graph, road, node, pos, heading, s, ego_road)
    }
}

fn resolve<'a>(
    record: &LaneRecord,
    ids: &[BoundaryID],
    by_id: &BTreeMap<BoundaryID, &'a LaneBoundaryRecord>,
) -> Result<Vec<&'a LaneBoundaryRecord>> {
    ids.iter()
        .map(|id| {
            by_id
                .get(id)
                .copied()
                .ok_or_else(|| anyhow!("{} references unknown {}", record.id, id))
        })
        .collect()
}
