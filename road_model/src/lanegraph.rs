use std::collections::BTreeMap;

use anyhow::Result;
use geom::{Distance, Pt3D};
use serde::{Deserialize, Serialize};

use raw_scene::{LaneID, LaneSubtype, LaneType};

use crate::Lane;

/// How far apart one lane's end and another lane's start may lie and still count as the same
/// longitudinal chain.
pub const SUCCESSOR_MAX_DISTANCE: Distance = Distance::const_meters(0.1);

/// A value for a lane and, when the neighbor exists, for its immediate left and right lanes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborLanes<T> {
    pub current: T,
    pub left: Option<T>,
    pub right: Option<T>,
}

/// How far three chains (the current lane's and its two neighbors') run until they reach an
/// offramp or connecting ramp. A side without a chain, or whose chain dies before a ramp,
/// reports nothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampDistances {
    pub current: Option<Distance>,
    pub left: Option<Distance>,
    pub right: Option<Distance>,
}

/// One drivable lane in the graph. Relations are arena indices into the owning `LaneGraph`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneGraphNode {
    pub lane: Lane,
    left: Option<usize>,
    right: Option<usize>,
    predecessor: Option<usize>,
    successor: Option<usize>,
}

/// The lane ladder for one snapshot: every drivable lane, linked sideways by declared adjacency
/// and longitudinally by endpoint proximity. Each lane has at most one neighbor per direction;
/// a snapshot violating that doesn't build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneGraph {
    nodes: Vec<LaneGraphNode>,
    by_id: BTreeMap<LaneID, usize>,
}

impl LaneGraph {
    /// Links all lanes whose type allows driving; the rest are dropped.
    pub fn new(lanes: Vec<Lane>) -> Result<LaneGraph> {
        let mut graph = LaneGraph::default();
        for lane in lanes {
            if !lane.lane_type.allows_driving() {
                continue;
            }
            let id = lane.id;
            let idx = graph.nodes.len();
            if graph.by_id.insert(id, idx).is_some() {
                bail!("{} appears twice", id);
            }
            graph.nodes.push(LaneGraphNode {
                lane,
                left: None,
                right: None,
                predecessor: None,
                successor: None,
            });
        }
        graph.link_neighbors()?;
        graph.link_successors()?;
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: LaneID) -> Option<&LaneGraphNode> {
        self.by_id.get(&id).map(|idx| &self.nodes[*idx])
    }

    /// All nodes, in lane id order.
    pub fn nodes(&self) -> impl Iterator<Item = &LaneGraphNode> {
        self.by_id.values().map(move |idx| &self.nodes[*idx])
    }

    pub fn left_of(&self, node: &LaneGraphNode) -> Option<&LaneGraphNode> {
        node.left.map(|idx| &self.nodes[idx])
    }

    pub fn right_of(&self, node: &LaneGraphNode) -> Option<&LaneGraphNode> {
        node.right.map(|idx| &self.nodes[idx])
    }

    pub fn predecessor_of(&self, node: &LaneGraphNode) -> Option<&LaneGraphNode> {
        node.predecessor.map(|idx| &self.nodes[idx])
    }

    pub fn successor_of(&self, node: &LaneGraphNode) -> Option<&LaneGraphNode> {
        node.successor.map(|idx| &self.nodes[idx])
    }

    fn link_neighbors(&mut self) -> Result<()> {
        for idx in 0..self.nodes.len() {
            for other in self.nodes[idx].lane.left_adjacent.clone() {
                if let Some(&left) = self.by_id.get(&other) {
                    self.set_left(idx, left)?;
                    self.set_right(left, idx)?;
                }
            }
            for other in self.nodes[idx].lane.right_adjacent.clone() {
                if let Some(&right) = self.by_id.get(&other) {
                    self.set_right(idx, right)?;
                    self.set_left(right, idx)?;
                }
            }
        }
        Ok(())
    }

    fn set_left(&mut self, node: usize, left: usize) -> Result<()> {
        match self.nodes[node].left {
            None => {
                self.nodes[node].left = Some(left);
            }
            Some(existing) if existing == left => {}
            Some(existing) => bail!(
                "{} has multiple left neighbors ({} and {})",
                self.nodes[node].lane.id,
                self.nodes[existing].lane.id,
                self.nodes[left].lane.id
            ),
        }
        Ok(())
    }

    fn set_right(&mut self, node: usize, right: usize) -> Result<()> {
        match self.nodes[node].right {
            None => {
                self.nodes[node].right = Some(right);
            }
            Some(existing) if existing == right => {}
            Some(existing) => bail!(
                "{} has multiple right neighbors ({} and {})",
                self.nodes[node].lane.id,
                self.nodes[existing].lane.id,
                self.nodes[right].lane.id
            ),
        }
        Ok(())
    }

    fn link_successors(&mut self) -> Result<()> {
        // O(n^2) endpoint scan; snapshots only carry the lanes around the scene.
        for pre in 0..self.nodes.len() {
            for succ in 0..self.nodes.len() {
                if pre == succ {
                    continue;
                }
                let end = self.nodes[pre].lane.centerline().last_pt();
                let start = self.nodes[succ].lane.centerline().first_pt();
                if end.dist_to(start) <= SUCCESSOR_MAX_DISTANCE {
                    self.set_successor(pre, succ)?;
                }
            }
        }
        Ok(())
    }

    fn set_successor(&mut self, pre: usize, succ: usize) -> Result<()> {
        if self.nodes[pre].successor.is_some() {
            bail!("{} has multiple successors", self.nodes[pre].lane.id);
        }
        if self.nodes[succ].predecessor.is_some() {
            bail!("{} has multiple predecessors", self.nodes[succ].lane.id);
        }
        self.nodes[pre].successor = Some(succ);
        self.nodes[succ].predecessor = Some(pre);
        Ok(())
    }

    /// Remaining distance until the successor chain runs out, from `pos` on the lane and from
    /// the same position projected onto its left/right neighbors.
    pub fn distance_to_lane_end(&self, lane: LaneID, pos: Pt3D) -> Option<NeighborLanes<Distance>> {
        let node = self.get(lane)?;
        Some(NeighborLanes {
            current: self.chain_distance_to_end(node, pos),
            left: self.left_of(node).map(|n| self.chain_distance_to_end(n, pos)),
            right: self
                .right_of(node)
                .map(|n| self.chain_distance_to_end(n, pos)),
        })
    }

    fn chain_distance_to_end(&self, node: &LaneGraphNode, pos: Pt3D) -> Distance {
        let projection = node.lane.project(pos);
        let mut distance = node.lane.dist_to_end(&projection);
        let mut current = node;
        // A malformed scene can close the chain into a cycle; bound the walk to stay total.
        for _ in 0..self.nodes.len() {
            match self.successor_of(current) {
                Some(next) => {
                    distance += next.lane.total_length();
                    current = next;
                }
                None => break,
            }
        }
        distance
    }

    /// Distance until the road's rightmost chain reaches an exit lane, if one lies ahead. An
    /// exit on the current level doesn't count; the walk starts at the next one.
    pub fn distance_to_next_exit(&self, lane: LaneID, pos: Pt3D) -> Option<Distance> {
        let node = self.get(lane)?;
        let projection = node.lane.project(pos);
        let mut distance = node.lane.dist_to_end(&projection);
        let mut cursor = self.next_level(self.rightmost(node));
        for _ in 0..self.nodes.len() {
            let node = cursor?;
            if node.lane.subtype == LaneSubtype::Exit {
                return Some(distance);
            }
            distance += node.lane.total_length();
            cursor = self.next_level(node);
        }
        None
    }

    /// Distance until each of three cursors (the lane, its left neighbor, its right neighbor)
    /// reaches an offramp or connecting ramp. Starting on a ramp reports nothing at all. A side
    /// cursor starts once, the first time the center cursor sees a neighbor there; the left one
    /// only if that neighbor runs in the same direction.
    pub fn distance_to_ramp(&self, lane: LaneID, pos: Pt3D) -> Option<RampDistances> {
        let center = self.get(lane)?;
        if center.lane.subtype.is_ramp() {
            return Some(RampDistances {
                current: None,
                left: None,
                right: None,
            });
        }
        let projection = center.lane.project(pos);
        let initial = center.lane.dist_to_end(&projection);

        let mut current = Some(initial);
        let mut left = None;
        let mut right = None;
        let mut moved_left = false;
        let mut moved_right = false;

        let mut left_node = None;
        if let Some(neighbor) = self.left_of(center) {
            moved_left = true;
            if same_direction(&neighbor.lane, &center.lane) {
                left_node = Some(neighbor);
                left = Some(initial);
            }
        }
        let mut right_node = None;
        if let Some(neighbor) = self.right_of(center) {
            moved_right = true;
            right_node = Some(neighbor);
            right = Some(initial);
        }
        let mut center_node = Some(center);

        left_node = self.next_in_chain(left_node);
        if left_node.is_none() {
            left = None;
        }
        right_node = self.next_in_chain(right_node);
        if right_node.is_none() {
            right = None;
        }
        center_node = self.next_in_chain(center_node);
        if center_node.is_none() {
            current = None;
        }

        for _ in 0..self.nodes.len() + 2 {
            if left_node.is_none() && right_node.is_none() && center_node.is_none() {
                break;
            }
            if let Some(center) = center_node {
                if !moved_left {
                    if let Some(neighbor) = self.left_of(center) {
                        moved_left = true;
                        if same_direction(&neighbor.lane, &center.lane) {
                            left_node = Some(neighbor);
                            left = current;
                        }
                    }
                }
                if !moved_right {
                    if let Some(neighbor) = self.right_of(center) {
                        moved_right = true;
                        right_node = Some(neighbor);
                        right = current;
                    }
                }
            }
            if let Some(node) = left_node {
                if node.lane.subtype.is_ramp() {
                    // Found; `left` keeps the distance accumulated so far.
                    left_node = None;
                } else {
                    left = left.map(|d| d + node.lane.total_length());
                    left_node = self.next_in_chain(Some(node));
                    if left_node.is_none() {
                        left = None;
                    }
                }
            }
            if let Some(node) = right_node {
                if node.lane.subtype.is_ramp() {
                    right_node = None;
                } else {
                    right = right.map(|d| d + node.lane.total_length());
                    right_node = self.next_in_chain(Some(node));
                    if right_node.is_none() {
                        right = None;
                    }
                }
            }
            if let Some(node) = center_node {
                if node.lane.subtype.is_ramp() {
                    center_node = None;
                } else {
                    current = current.map(|d| d + node.lane.total_length());
                    center_node = self.next_in_chain(Some(node));
                    if center_node.is_none() {
                        current = None;
                    }
                }
            }
        }
        // Cursors still alive here are stuck in a cycle; they have no answer.
        if left_node.is_some() {
            left = None;
        }
        if right_node.is_some() {
            right = None;
        }
        if center_node.is_some() {
            current = None;
        }
        Some(RampDistances {
            current,
            left,
            right,
        })
    }

    /// The type and subtype of a lane and of its immediate neighbors.
    pub fn neighbor_types(&self, lane: LaneID) -> Option<NeighborLanes<(LaneType, LaneSubtype)>> {
        let node = self.get(lane)?;
        Some(NeighborLanes {
            current: (node.lane.lane_type, node.lane.subtype),
            left: self
                .left_of(node)
                .map(|n| (n.lane.lane_type, n.lane.subtype)),
            right: self
                .right_of(node)
                .map(|n| (n.lane.lane_type, n.lane.subtype)),
        })
    }

    fn rightmost<'a>(&'a self, mut node: &'a LaneGraphNode) -> &'a LaneGraphNode {
        for _ in 0..self.nodes.len() {
            match self.right_of(node) {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }

    /// Crosses from one road level to the next: the first lane up the leftward chain that has a
    /// successor, descended to that successor's rightmost lane.
    fn next_level<'a>(&'a self, node: &'a LaneGraphNode) -> Option<&'a LaneGraphNode> {
        let mut cursor = Some(node);
        for _ in 0..self.nodes.len() {
            let node = cursor?;
            if let Some(successor) = self.successor_of(node) {
                return Some(self.rightmost(successor));
            }
            cursor = self.left_of(node);
        }
        None
    }

    /// The chain step for ramp walks. Crossing into an entry lane only works from another entry
    /// lane; everything else ends the chain there.
    fn next_in_chain<'a>(&'a self, node: Option<&'a LaneGraphNode>) -> Option<&'a LaneGraphNode> {
        let node = node?;
        let successor = self.successor_of(node);
        if node.lane.subtype != LaneSubtype::Entry
            && successor.map_or(true, |s| s.lane.subtype == LaneSubtype::Entry)
        {
            return None;
        }
        successor
    }
}

/// Endpoint heuristic for whether two laterally adjacent lanes run the same way: the tip-to-tip
/// distances must strictly beat the crossed ones. Kept as a heuristic on purpose; its exact
/// tie-breaking decides which ramp chains get seeded.
fn same_direction(a: &Lane, b: &Lane) -> bool {
    let (a_start, a_end) = (a.centerline().first_pt(), a.centerline().last_pt());
    let (b_start, b_end) = (b.centerline().first_pt(), b.centerline().last_pt());
    a_start.dist_to(b_start) + a_end.dist_to(b_end)
        < a_start.dist_to(b_end) + a_end.dist_to(b_start)
}
