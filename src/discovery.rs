//! Route discovery (C5): low-level queries over the static data store that
//! the pathfinder builds on top of.

use std::collections::HashSet;

use crate::{model::Repository, shared::geo::Coordinate};

/// The one hard-coded loop suppression named in the glossary: a rider
/// cannot ride a "To KDOJ" trip into a "To Cluster" trip on the same loop
/// route — the physical loop doesn't connect that way. Consulted by
/// `astar::expand` whenever a same-route continuation would change headsign.
pub(crate) fn is_suppressed_loop(trip1_headsign: &str, trip2_headsign: &str) -> bool {
    trip1_headsign == "To KDOJ" && trip2_headsign == "To Cluster"
}

/// One downstream alighting candidate reachable from `origin_stop` by
/// staying on a single trip, landing within walking distance of a
/// destination point.
#[derive(Debug, Clone, Copy)]
pub struct NearbyRide {
    pub trip_idx: u32,
    pub origin_index: usize,
    pub downstream_index: usize,
    pub downstream_stop: u32,
}

/// `routesToNearbyStops`: every (trip, downstream stop) pair reachable
/// from `origin_stop` where the downstream stop lies within `max_walk_m`
/// of `dest_point`. De-duplicated by `(route, headsign, downstream stop)`.
pub fn routes_to_nearby_stops(
    repo: &Repository,
    origin_stop: u32,
    dest_point: Coordinate,
    max_walk_m: f32,
) -> Vec<NearbyRide> {
    let mut seen: HashSet<(u32, String, u32)> = HashSet::new();
    let mut out = Vec::new();

    for (route_idx, service) in repo.routes_serving_stop(origin_stop) {
        let trip = repo.trip_by_idx(service.trip_idx);
        for (downstream_index, &downstream_stop) in
            trip.stops_sequence.iter().enumerate().skip(service.stop_index + 1)
        {
            let stop = repo.stop_by_idx(downstream_stop);
            let dist = stop.coordinate.network_distance(&dest_point).as_meters();
            if dist > max_walk_m {
                continue;
            }
            let key = (*route_idx, trip.headsign.to_string(), downstream_stop);
            if !seen.insert(key) {
                continue;
            }
            out.push(NearbyRide {
                trip_idx: service.trip_idx,
                origin_index: service.stop_index,
                downstream_index,
                downstream_stop,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::load::load_repository;

    fn repo() -> Repository {
        let schedule = r#"{
            "stops": [
                {"id": "KP1", "name": "KP1", "lat": 3.1201, "lon": 101.6544},
                {"id": "CP", "name": "Central Plaza", "lat": 3.1230, "lon": 101.6560},
                {"id": "KDOJ", "name": "KDOJ", "lat": 3.1260, "lon": 101.6590}
            ],
            "routes": [
                {
                    "name": "Route A",
                    "services": [
                        {
                            "service_id": "weekday",
                            "days": ["monday"],
                            "trips": [
                                {"headsign": "To KDOJ", "stops_sequence": ["KP1", "CP", "KDOJ"], "times": ["08:00"]}
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let durations = r#"{
            "Route A_To KDOJ": {
                "segments": [
                    {"from_stop_id": "KP1", "to_stop_id": "CP", "total_secs": 300},
                    {"from_stop_id": "CP", "to_stop_id": "KDOJ", "total_secs": 420}
                ]
            }
        }"#;
        load_repository(schedule, r#"{"locations": []}"#, durations, None).unwrap()
    }

    #[test]
    fn suppresses_the_kdoj_to_cluster_loop_pair() {
        assert!(is_suppressed_loop("To KDOJ", "To Cluster"));
        assert!(!is_suppressed_loop("To Cluster", "To KDOJ"));
        assert!(!is_suppressed_loop("To KDOJ", "To KDOJ"));
    }

    #[test]
    fn routes_to_nearby_stops_dedups_by_route_and_headsign() {
        let repo = repo();
        let kp1 = repo.stop_by_id("KP1").unwrap().index;
        let kdoj = repo.stop_by_id("KDOJ").unwrap();
        let rides = routes_to_nearby_stops(&repo, kp1, kdoj.coordinate, 50.0);
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].downstream_stop, kdoj.index);
    }
}
