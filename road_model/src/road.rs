use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use geom::{Distance, Pt3D};
use serde::{Deserialize, Serialize};

use raw_scene::{LaneID, LaneSubtype, TrafficSignRecord};

use crate::{LaneGraph, LaneGraphNode};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RoadID(pub usize);

impl fmt::Display for RoadID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Road #{}", self.0)
    }
}

/// A traffic sign attached to a road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadSignal {
    pub road: RoadID,
    /// Longitudinal position of the sign along the road.
    pub s: Distance,
    /// The lane the sign was matched against.
    pub lane: LaneID,
    pub sign: TrafficSignRecord,
}

/// A maximal run of merged lanes. The rightmost lane of each longitudinal level forms the
/// reference path; all road-relative measures project onto it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadID,
    /// The rightmost lane per level, in driving order.
    rightmost: Vec<LaneID>,
    /// Each level's rightmost centerline length.
    lengths: Vec<Distance>,
    total: Distance,
    /// Whether any merged lane is an entry or exit lane.
    pub on_highway: bool,
    pub signals: Vec<RoadSignal>,
}

impl Road {
    pub fn total_length(&self) -> Distance {
        self.total
    }

    pub fn rightmost_lanes(&self) -> &Vec<LaneID> {
        &self.rightmost
    }

    /// Longitudinal position of `pos` for an object on `lane`: walk right to the reference
    /// path, project onto that lane, measure from the road's start. Returns the position and
    /// the road's total length. Fails when `lane` can't reach the reference path, which means
    /// the graph and this road disagree.
    pub fn object_road_s(
        &self,
        graph: &LaneGraph,
        lane: LaneID,
        pos: Pt3D,
    ) -> Result<(Distance, Distance)> {
        let (level, reference) = self.reference_level(graph, lane)?;
        let projection = reference.lane.project(pos);
        let mut s = reference.lane.centerline().dist_along(&projection);
        for length in &self.lengths[..level] {
            s += *length;
        }
        Ok((s, self.total))
    }

    fn reference_level<'a>(
        &self,
        graph: &'a LaneGraph,
        lane: LaneID,
    ) -> Result<(usize, &'a LaneGraphNode)> {
        let mut node = graph
            .get(lane)
            .ok_or_else(|| anyhow!("{} is not in the lane graph", lane))?;
        for _ in 0..graph.len() {
            if let Some(level) = self.rightmost.iter().position(|id| *id == node.lane.id) {
                return Ok((level, node));
            }
            node = graph
                .right_of(node)
                .ok_or_else(|| anyhow!("{} is not part of {}", lane, self.id))?;
        }
        bail!("{} never reaches the reference path of {}", lane, self.id)
    }

    /// Where the run of consecutive exit levels starting at `lane` ends, measured from the
    /// road's start. Only meaningful for a reference-path lane with subtype Exit.
    pub fn s_of_exit_end(&self, graph: &LaneGraph, lane: LaneID) -> Option<Distance> {
        let node = graph.get(lane)?;
        if node.lane.subtype != LaneSubtype::Exit {
            return None;
        }
        let level = self.rightmost.iter().position(|id| *id == lane)?;
        let mut s: Distance = self.lengths[..level].iter().copied().sum();
        for (id, length) in self.rightmost.iter().zip(&self.lengths).skip(level) {
            match graph.get(*id) {
                Some(node) if node.lane.subtype == LaneSubtype::Exit => {
                    s += *length;
                }
                _ => break,
            }
        }
        Some(s)
    }
}

/// Merges a lane graph into roads. Rebuilt from scratch for every snapshot; the lane-to-road
/// table never outlives the graph it was derived from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadManager {
    roads: Vec<Road>,
    lane_to_road: BTreeMap<LaneID, RoadID>,
}

impl RoadManager {
    /// Repeats merge passes until one creates no road. Every created road claims at least one
    /// unclaimed lane, so the loop ends.
    pub fn build(graph: &LaneGraph) -> RoadManager {
        let mut manager = RoadManager::default();
        loop {
            let before = manager.roads.len();
            for node in graph.nodes() {
                if manager.lane_to_road.contains_key(&node.lane.id) {
                    continue;
                }
                if manager.is_rightmost_beginning(graph, node) {
                    manager.create_road(graph, node);
                }
            }
            if manager.roads.len() == before {
                break;
            }
        }
        manager
    }

    pub fn roads(&self) -> &Vec<Road> {
        &self.roads
    }

    pub fn road(&self, id: RoadID) -> &Road {
        &self.roads[id.0]
    }

    pub(crate) fn road_mut(&mut self, id: RoadID) -> &mut Road {
        &mut self.roads[id.0]
    }

    pub fn road_for(&self, lane: LaneID) -> Option<&Road> {
        self.lane_to_road.get(&lane).map(|id| &self.roads[id.0])
    }

    pub fn lane_to_road(&self) -> &BTreeMap<LaneID, RoadID> {
        &self.lane_to_road
    }

    /// A road starts at a lane with nobody to its right and no predecessor anywhere up its
    /// leftward chain.
    fn is_rightmost_beginning(&self, graph: &LaneGraph, node: &LaneGraphNode) -> bool {
        if self.same_road_right(graph, node).is_some() {
            return false;
        }
        let mut cursor = Some(node);
        for _ in 0..graph.len() {
            match cursor {
                Some(current) => {
                    if self.same_road_predecessor(graph, current).is_some() {
                        return false;
                    }
                    cursor = self.same_road_left(graph, current);
                }
                None => break,
            }
        }
        true
    }

    fn create_road(&mut self, graph: &LaneGraph, start: &LaneGraphNode) {
        let id = RoadID(self.roads.len());
        let mut rightmost = Vec::new();
        let mut lengths = Vec::new();
        let mut on_highway = false;
        let mut cursor = Some(start);
        for _ in 0..graph.len() {
            match cursor {
                Some(level) => {
                    on_highway |= self.claim_level(graph, level, id);
                    rightmost.push(level.lane.id);
                    lengths.push(level.lane.total_length());
                    cursor = self.next_level(graph, level);
                }
                None => break,
            }
        }
        let total = lengths.iter().copied().sum();
        self.roads.push(Road {
            id,
            rightmost,
            lengths,
            total,
            on_highway,
            signals: Vec::new(),
        });
    }

    /// Claims the level's rightmost lane and its same-road parallels to the left, stopping at
    /// the first already-claimed lane. Returns whether any claimed lane is an entry or exit.
    fn claim_level(&mut self, graph: &LaneGraph, level: &LaneGraphNode, road: RoadID) -> bool {
        let mut on_highway = false;
        let mut cursor = Some(level);
        for _ in 0..graph.len() {
            match cursor {
                Some(node) => {
                    if self.lane_to_road.contains_key(&node.lane.id) {
                        break;
                    }
                    self.lane_to_road.insert(node.lane.id, road);
                    on_highway |=
                        matches!(node.lane.subtype, LaneSubtype::Entry | LaneSubtype::Exit);
                    cursor = self.same_road_left(graph, node);
                }
                None => break,
            }
        }
        on_highway
    }

    /// The next reference-path lane: the first lane up the current level's leftward chain with
    /// a same-road successor, descended to that successor's rightmost unclaimed lane.
    fn next_level<'a>(
        &self,
        graph: &'a LaneGraph,
        level: &'a LaneGraphNode,
    ) -> Option<&'a LaneGraphNode> {
        let mut cursor = Some(level);
        for _ in 0..graph.len() {
            match cursor {
                Some(node) => {
                    if let Some(successor) = self.same_road_successor(graph, node) {
                        return Some(self.rightmost_unclaimed(graph, successor));
                    }
                    cursor = self.same_road_left(graph, node);
                }
                None => break,
            }
        }
        None
    }

    fn rightmost_unclaimed<'a>(
        &self,
        graph: &'a LaneGraph,
        mut node: &'a LaneGraphNode,
    ) -> &'a LaneGraphNode {
        for _ in 0..graph.len() {
            match self.same_road_right(graph, node) {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }

    fn same_road_right<'a>(
        &self,
        graph: &'a LaneGraph,
        node: &LaneGraphNode,
    ) -> Option<&'a LaneGraphNode> {
        let right = graph.right_of(node)?;
        if right.lane.lane_type != node.lane.lane_type {
            return None;
        }
        if self.lane_to_road.contains_key(&right.lane.id) {
            return None;
        }
        Some(right)
    }

    // Roads are claimed right to left, so a claimed left neighbor of a claimed lane is part of
    // the same road and the walk may pass through it. A claimed left of an UNCLAIMED lane would
    // contradict that order; treat it as a road boundary.
    fn same_road_left<'a>(
        &self,
        graph: &'a LaneGraph,
        node: &LaneGraphNode,
    ) -> Option<&'a LaneGraphNode> {
        let left = graph.left_of(node)?;
        if left.lane.lane_type != node.lane.lane_type {
            return None;
        }
        if self.lane_to_road.contains_key(&left.lane.id)
            && !self.lane_to_road.contains_key(&node.lane.id)
        {
            return None;
        }
        Some(left)
    }

    fn same_road_successor<'a>(
        &self,
        graph: &'a LaneGraph,
        node: &LaneGraphNode,
    ) -> Option<&'a LaneGraphNode> {
        let successor = graph.successor_of(node)?;
        if self.lane_to_road.contains_key(&successor.lane.id) {
            return None;
        }
        if successor.lane.lane_type != node.lane.lane_type {
            return None;
        }
        if !compatible_subtypes(node.lane.subtype, successor.lane.subtype) {
            return None;
        }
        Some(successor)
    }

    fn same_road_predecessor<'a>(
        &self,
        graph: &'a LaneGraph,
        node: &LaneGraphNode,
    ) -> Option<&'a LaneGraphNode> {
        let predecessor = graph.predecessor_of(node)?;
        if self.lane_to_road.contains_key(&predecessor.lane.id) {
            return None;
        }
        if predecessor.lane.lane_type != node.lane.lane_type {
            return None;
        }
        if !compatible_subtypes(predecessor.lane.subtype, node.lane.subtype) {
            return None;
        }
        Some(predecessor)
    }
}

/// Which subtype transitions keep two successive lanes on the same road.
fn compatible_subtypes(from: LaneSubtype, to: LaneSubtype) -> bool {
    use LaneSubtype::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Normal, Exit) | (Entry, Normal) | (Entry, Exit) | (Offramp, Onramp)
    )
}
