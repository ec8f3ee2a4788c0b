use std::sync::{Arc, RwLock};

use anyhow::Result;

use geom::{Angle, Distance};
use raw_scene::{
    LaneBoundaryRecord, LaneRecord, MovingObjectRecord, SceneSnapshot, TrafficSignRecord,
};

use crate::{RoadID, RoadNetwork, RoadState, SceneState};

/// The entry point: owns the current road network and rebuilds it as snapshots deliver lane
/// records. One writer calls `update_lanes` or `process`; readers call the query methods from
/// any thread and only hold the lock long enough to clone the `Arc`.
pub struct Extractor {
    network: RwLock<Arc<RoadNetwork>>,
}

impl Extractor {
    /// Starts with an empty network; queries miss until the first lane update.
    pub fn new() -> Extractor {
        Extractor {
            network: RwLock::new(Arc::new(RoadNetwork::empty())),
        }
    }

    /// The current network. Queries against the clone see a consistent snapshot even while an
    /// update swaps in a new one.
    pub fn network(&self) -> Arc<RoadNetwork> {
        self.network.read().unwrap().clone()
    }

    /// Rebuilds the network from a snapshot's lane records and publishes it. The build runs
    /// without the lock; readers keep the previous network until the swap, and keep it
    /// altogether when the build fails.
    pub fn update_lanes(
        &self,
        lanes: &[LaneRecord],
        boundaries: &[LaneBoundaryRecord],
        signs: &[TrafficSignRecord],
    ) -> Result<()> {
        let network = RoadNetwork::build(lanes, boundaries, signs)?;
        *self.network.write().unwrap() = Arc::new(network);
        Ok(())
    }

    /// Digests one snapshot: updates the network when the snapshot carries lanes (a rejected
    /// update is logged and the previous network keeps serving), then attributes every object.
    /// Fails only when the host vehicle is missing.
    pub fn process(&self, snapshot: &SceneSnapshot) -> Result<SceneState> {
        if !snapshot.lanes.is_empty() {
            if let Err(err) =
                self.update_lanes(&snapshot.lanes, &snapshot.boundaries, &snapshot.signs)
            {
                warn!("Keeping the previous road network: {}", err);
            }
        }
        let network = self.network();
        SceneState::new(snapshot, &network)
    }

    /// The road of the object's first assigned lane.
    pub fn road_id_for(&self, record: &MovingObjectRecord) -> Option<RoadID> {
        let lane = *record.assigned_lanes.first()?;
        self.network().road_id_for(lane)
    }

    /// The object's longitudinal road position and the road's total length.
    pub fn road_s_for(&self, record: &MovingObjectRecord) -> Option<(Distance, Distance)> {
        let lane = *record.assigned_lanes.first()?;
        self.network().road_s_for(lane, record.position)
    }

    /// The full road-state bundle for one object, with no ego to compare against.
    pub fn road_state_for(&self, record: &MovingObjectRecord) -> Option<RoadState> {
        let lane = *record.assigned_lanes.first()?;
        self.network().road_state_for(
            lane,
            record.position,
            Angle::radians(record.orientation.yaw()),
            None,
        )
    }
}

impl Default for Extractor {
    fn default() -> Extractor {
        Extractor::new()
    }
}
