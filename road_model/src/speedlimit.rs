use geom::{Distance, Speed};
use raw_scene::LaneSubtype;

use crate::{LaneGraph, Road};

/// Derives the speed limit at `object_s` along a road by replaying the road's speed signs in
/// order. Signs must appear at strictly increasing positions up to the object; anything else is
/// treated as a stale or conflicting posting and skipped. End signs clear the limit.
///
/// Signs standing on an exit lane only bind while the object is still within the exit's run, and
/// not at all when `ignore_exit_speed_signs` is set. Vehicles staying on a highway's through
/// lanes pass exit signage without being subject to it.
pub fn calculate_speed_limit(
    road: &Road,
    graph: &LaneGraph,
    object_s: Distance,
    ignore_exit_speed_signs: bool,
) -> Option<Speed> {
    let mut limit = None;
    let mut latest_s: Option<Distance> = None;
    for signal in &road.signals {
        if !signal.sign.sign_type.affects_speed_limit() {
            continue;
        }
        if latest_s.map_or(false, |s| signal.s <= s) || signal.s > object_s {
            continue;
        }
        if let Some(node) = graph.get(signal.lane) {
            if node.lane.subtype == LaneSubtype::Exit {
                if ignore_exit_speed_signs {
                    continue;
                }
                match road.s_of_exit_end(graph, signal.lane) {
                    Some(exit_end) if exit_end >= object_s => {}
                    _ => continue,
                }
            }
        }
        let next = if signal.sign.sign_type.ends_limit() {
            None
        } else {
            match signal.sign.value {
                Some(km_per_hour) => Some(Speed::km_per_hour(km_per_hour)),
                // A posting sign without a value tells us nothing; it doesn't even advance the
                // position tracker.
                None => continue,
            }
        };
        latest_s = Some(signal.s);
        limit = next;
    }
    limit
}
