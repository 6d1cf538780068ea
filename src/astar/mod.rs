//! The pathfinding engine (C6) — the core of the planning service.
//!
//! A heuristic search over `(stop, arrival-time, accumulated-penalty)`
//! states, in the spirit of the project's oldest prototype
//! (`Rc<Node>`-chained `BinaryHeap` search with g/h scores): a binary
//! min-heap keyed on `f = g + h`, a closed set of best-`g`-seen per stop,
//! and an admissible heuristic bounded by the network's fastest possible
//! travel speed. Runs synchronously and performs no I/O — the only
//! suspension points in a request live in the async call sites around it
//! (location resolution, collaborator enrichment).

mod step;

pub use step::{Point, Step};

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use crate::{
    config::Tuning,
    discovery,
    model::{entities::Headsign, Repository},
    schedule,
    shared::{
        geo::Coordinate,
        time::{Duration, Time, Weekday},
    },
};

/// Which route/trip a node's most recent step boarded, used to decide
/// whether the next bus edge continues the same ride (cheap) or counts as
/// a fresh boarding/transfer (penalized).
#[derive(Debug, Clone, PartialEq, Eq)]
struct LastLeg {
    route_idx: u32,
    headsign: Headsign,
}

#[derive(Debug, Clone)]
struct SearchNode {
    stop: u32,
    clock_time: Time,
    day: Weekday,
    elapsed: Duration,
    penalty: Duration,
    last_leg: Option<LastLeg>,
    path: Vec<Step>,
    is_goal: bool,
}

impl SearchNode {
    fn g(&self) -> Duration {
        self.elapsed + self.penalty
    }
}

fn heuristic(repo: &Repository, stop_idx: u32, dest: Coordinate, bus_speed_kmh: f32) -> Duration {
    let stop = repo.stop_by_idx(stop_idx);
    let dist_km = stop.coordinate.euclidean_distance(&dest).as_kilometers();
    Duration::from_seconds(((dist_km / bus_speed_kmh) * 3600.0).round() as u32)
}

fn walk_duration(meters: f32, walk_speed_kmh: f32) -> Duration {
    let speed_m_s = walk_speed_kmh * 1000.0 / 3600.0;
    Duration::from_seconds((meters / speed_m_s).round() as u32)
}

struct HeapEntry {
    f_ticks: u32,
    seq: u64,
    node: SearchNode,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_ticks == other.f_ticks && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on
        // `f`, with ties broken by insertion order for determinism — the
        // same trick the project's original prototype used on `Node::cost`.
        other.f_ticks.cmp(&self.f_ticks).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether the search should rank candidates ignoring wait time (§9's
/// resolved "isAnytime" semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    Scheduled,
    Anytime,
}

pub struct SearchResult {
    pub path: Vec<Step>,
    pub eta: Time,
    pub eta_day: Weekday,
}

/// Runs the A* search from `origin_point` to `dest_point`. Both origin and
/// destination are resolved to coordinates by the caller (C4) before this
/// function ever runs — the engine itself only deals in geography and the
/// static schedule.
#[allow(clippy::too_many_arguments)]
pub fn search(
    repo: &Repository,
    tuning: &Tuning,
    origin_point: Coordinate,
    dest_point: Coordinate,
    query_time: Time,
    query_day: Weekday,
    rank_mode: RankMode,
) -> Option<SearchResult> {
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut best_g: HashMap<u32, Duration> = HashMap::new();

    for (stop_idx, walk_dist_m) in start_frontier(repo, tuning, origin_point, dest_point) {
        let walk_time = walk_duration(walk_dist_m, tuning.walk_speed_kmh);
        let direct_bonus = !discovery::routes_to_nearby_stops(
            repo,
            stop_idx,
            dest_point,
            tuning.max_walk_dest_m,
        )
        .is_empty();
        let reluctance = if direct_bonus {
            tuning.initial_walk_reluctance * tuning.direct_to_dest_bonus
        } else {
            tuning.initial_walk_reluctance
        };
        let penalty = walk_time.scale((reluctance - 1.0).max(0.0));
        let (clock_time, days) = query_time.add_wrapping(walk_time);
        let day = query_day.advance(days);

        let node = SearchNode {
            stop: stop_idx,
            clock_time,
            day,
            elapsed: walk_time,
            penalty,
            last_leg: None,
            path: vec![Step::Walk {
                from: Point::Coordinate(origin_point),
                to: Point::Stop(stop_idx),
                distance: crate::shared::geo::Distance::from_meters(walk_dist_m),
                duration: walk_time,
                penalty,
            }],
            is_goal: false,
        };
        seq += 1;
        heap.push(HeapEntry { f_ticks: node.g().as_seconds(), seq, node });
    }

    let mut iterations = 0usize;
    // Best non-goal node popped so far, by distance to the destination —
    // what `max_open_set` cap-out falls back to instead of abandoning the
    // search outright.
    let mut incumbent: Option<(f32, SearchNode)> = None;
    let mut capped = false;

    while let Some(HeapEntry { node, .. }) = heap.pop() {
        if node.is_goal {
            return Some(SearchResult {
                path: node.path,
                eta: node.clock_time,
                eta_day: node.day,
            });
        }

        if node.elapsed > tuning.search_horizon {
            continue;
        }

        if let Some(&recorded) = best_g.get(&node.stop) {
            if recorded <= node.g() {
                continue;
            }
        }
        best_g.insert(node.stop, node.g());

        // Goal test: within final-walk range of the destination.
        let stop = repo.stop_by_idx(node.stop);
        let dist_to_dest = stop.coordinate.network_distance(&dest_point).as_meters();

        if incumbent.as_ref().is_none_or(|(best, _)| dist_to_dest < *best) {
            incumbent = Some((dist_to_dest, node.clone()));
        }

        iterations += 1;
        if iterations > tuning.max_open_set {
            capped = true;
            break;
        }

        if dist_to_dest <= tuning.max_walk_dest_m {
            if let Some(goal) = finalize(repo, tuning, &node, dest_point, dist_to_dest) {
                seq += 1;
                heap.push(HeapEntry {
                    f_ticks: goal.g().as_seconds(),
                    seq,
                    node: goal,
                });
            }
        }

        expand(repo, tuning, &node, dest_point, rank_mode, &mut heap, &mut seq);
    }

    if !capped {
        return None;
    }

    // Degrade to the best incumbent: close it out with a final walk leg to
    // the destination, however long, rather than abandoning the search.
    let (dist_to_dest, node) = incumbent?;
    finalize(repo, tuning, &node, dest_point, dist_to_dest).map(|goal| SearchResult {
        path: goal.path,
        eta: goal.clock_time,
        eta_day: goal.day,
    })
}

fn start_frontier(
    repo: &Repository,
    tuning: &Tuning,
    origin_point: Coordinate,
    dest_point: Coordinate,
) -> Vec<(u32, f32)> {
    let candidates = repo.stops_by_coordinate(origin_point, tuning.max_walk_origin_m);
    let _ = dest_point; // direct-bonus evaluated per-candidate by the caller
    let mut seen_keys: HashSet<(u32, Headsign)> = HashSet::new();
    let mut frontier = Vec::new();
    for (stop, dist) in candidates {
        let mut contributes = false;
        for (route_idx, service) in repo.routes_serving_stop(stop.index) {
            let trip = repo.trip_by_idx(service.trip_idx);
            if seen_keys.insert((*route_idx, trip.headsign.clone())) {
                contributes = true;
            }
        }
        if contributes {
            frontier.push((stop.index, dist));
        }
    }
    frontier
}

fn finalize(
    repo: &Repository,
    tuning: &Tuning,
    node: &SearchNode,
    dest_point: Coordinate,
    dist_to_dest_m: f32,
) -> Option<SearchNode> {
    const NEAR_STOP_THRESHOLD_M: f32 = 150.0;
    let other_stop_colocated = repo
        .stops_by_coordinate(dest_point, NEAR_STOP_THRESHOLD_M)
        .into_iter()
        .any(|(s, _)| s.index != node.stop);

    let reluctance = if other_stop_colocated {
        tuning.final_walk_reluctance
    } else {
        1.1
    };

    let walk_time = walk_duration(dist_to_dest_m, tuning.walk_speed_kmh);
    let penalty_add = walk_time.scale((reluctance - 1.0).max(0.0));
    let (clock_time, days) = node.clock_time.add_wrapping(walk_time);

    let mut path = node.path.clone();
    path.push(Step::Walk {
        from: Point::Stop(node.stop),
        to: Point::Coordinate(dest_point),
        distance: crate::shared::geo::Distance::from_meters(dist_to_dest_m),
        duration: walk_time,
        penalty: penalty_add,
    });

    Some(SearchNode {
        stop: node.stop,
        clock_time,
        day: node.day.advance(days),
        elapsed: node.elapsed + walk_time,
        penalty: node.penalty + penalty_add,
        last_leg: node.last_leg.clone(),
        path,
        is_goal: true,
    })
}

#[allow(clippy::too_many_arguments)]
fn expand(
    repo: &Repository,
    tuning: &Tuning,
    node: &SearchNode,
    dest_point: Coordinate,
    rank_mode: RankMode,
    heap: &mut BinaryHeap<HeapEntry>,
    seq: &mut u64,
) {
    let stop = repo.stop_by_idx(node.stop);
    let nearby = repo.stops_by_coordinate(stop.coordinate, tuning.transfer_walk_limit_m);

    for (board_stop, walk_dist_m) in nearby {
        let is_walk = board_stop.index != node.stop;
        let walk_time = if is_walk {
            walk_duration(walk_dist_m, tuning.walk_speed_kmh)
        } else {
            Duration::ZERO
        };
        let (board_clock, board_days) = node.clock_time.add_wrapping(walk_time);
        let board_day = node.day.advance(board_days);

        for (route_idx, service) in repo.routes_serving_stop(board_stop.index) {
            let trip = repo.trip_by_idx(service.trip_idx);

            let continues_suppressed_loop = node.last_leg.as_ref().is_some_and(|ll| {
                ll.route_idx == *route_idx
                    && ll.headsign != trip.headsign
                    && discovery::is_suppressed_loop(&ll.headsign.to_string(), &trip.headsign.to_string())
            });
            if continues_suppressed_loop {
                continue;
            }

            let Some(departure) = schedule::next_departure_any_day(
                repo,
                service.trip_idx,
                service.stop_index,
                board_day,
                board_clock,
            ) else {
                continue;
            };

            for j in (service.stop_index + 1)..trip.stops_sequence.len() {
                let ride_duration = trip.offsets[j] - trip.offsets[service.stop_index];
                let (arrival_clock, extra_days) = departure
                    .trip_start_time
                    .add_wrapping(trip.offsets[j]);
                let total_days = departure.days_forward + extra_days;
                let arrival_day = board_day.advance(total_days);

                let same_route_continue = !is_walk
                    && node
                        .last_leg
                        .as_ref()
                        .is_some_and(|ll| ll.route_idx == *route_idx && ll.headsign == trip.headsign);

                let mut incremental = if same_route_continue {
                    tuning.same_route_hop_penalty
                } else {
                    let mut inc = tuning.bus_board_penalty;
                    if is_walk {
                        let walk_penalty = walk_time.scale((tuning.walk_reluctance_factor - 1.0).max(0.0));
                        inc += walk_penalty + tuning.transfer_walk_penalty;
                    }
                    inc
                };

                let is_route_transfer = node
                    .last_leg
                    .as_ref()
                    .is_some_and(|ll| ll.route_idx != *route_idx);
                if !same_route_continue && is_route_transfer {
                    incremental += tuning.transfer_penalty;
                }

                let wait = if rank_mode == RankMode::Anytime {
                    Duration::ZERO
                } else {
                    departure.wait
                };

                let new_elapsed = node.elapsed + walk_time + wait + ride_duration;
                if new_elapsed > tuning.search_horizon {
                    continue;
                }
                let new_penalty = node.penalty + incremental;

                let mut path = node.path.clone();
                if is_walk {
                    path.push(Step::Walk {
                        from: Point::Stop(node.stop),
                        to: Point::Stop(board_stop.index),
                        distance: crate::shared::geo::Distance::from_meters(walk_dist_m),
                        duration: walk_time,
                        penalty: walk_time.scale((tuning.walk_reluctance_factor - 1.0).max(0.0)),
                    });
                }

                if same_route_continue {
                    if let Some(Step::Bus { alight_stop, alight_time, .. }) = path.last_mut() {
                        *alight_stop = trip.stops_sequence[j];
                        *alight_time = arrival_clock;
                    }
                } else {
                    path.push(Step::Bus {
                        route_idx: *route_idx,
                        headsign: trip.headsign.clone(),
                        trip_idx: service.trip_idx,
                        board_stop: board_stop.index,
                        alight_stop: trip.stops_sequence[j],
                        board_time: departure.trip_start_time + trip.offsets[service.stop_index],
                        alight_time: arrival_clock,
                        penalty: incremental,
                    });
                }

                let j_stop = trip.stops_sequence[j];
                let h = heuristic(repo, j_stop, dest_point, tuning.bus_speed_kmh);
                let next = SearchNode {
                    stop: j_stop,
                    clock_time: arrival_clock,
                    day: arrival_day,
                    elapsed: new_elapsed,
                    penalty: new_penalty,
                    last_leg: Some(LastLeg {
                        route_idx: *route_idx,
                        headsign: trip.headsign.clone(),
                    }),
                    path,
                    is_goal: false,
                };
                *seq += 1;
                heap.push(HeapEntry {
                    f_ticks: (next.g() + h).as_seconds(),
                    seq: *seq,
                    node: next,
                });
            }
        }
    }
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
    fn finds_a_direct_path_under_default_tuning() {
        let repo = repo();
        let tuning = Tuning::default();
        let origin = repo.stop_by_id("KP1").unwrap().coordinate;
        let dest = repo.stop_by_id("KDOJ").unwrap().coordinate;
        let result = search(&repo, &tuning, origin, dest, Time::from_hm("07:55").unwrap(), Weekday::Monday, RankMode::Scheduled)
            .expect("a path should be found");
        assert_eq!(result.eta, Time::from_hm("08:12").unwrap());
    }

    /// A `max_open_set` of zero caps out on the very first node popped —
    /// the search must still return the best incumbent reached rather than
    /// abandoning the query outright.
    #[test]
    fn degrades_to_best_incumbent_when_open_set_caps_out() {
        let repo = repo();
        let tuning = Tuning {
            max_open_set: 0,
            ..Tuning::default()
        };
        let origin = repo.stop_by_id("KP1").unwrap().coordinate;
        let dest = repo.stop_by_id("KDOJ").unwrap().coordinate;
        let result = search(&repo, &tuning, origin, dest, Time::from_hm("07:55").unwrap(), Weekday::Monday, RankMode::Scheduled);
        assert!(result.is_some(), "cap-out should degrade to an incumbent, not None");
    }
}
