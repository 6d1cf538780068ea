//! The itinerary builder (C7): turns a raw search path into the typed
//! WALK_ONLY / DIRECT / TRANSFER response, with timing, merging, and
//! (best-effort) walking enrichment from the external collaborator.

use serde::Serialize;

use crate::{
    astar::{Point, SearchResult, Step},
    config::Tuning,
    model::Repository,
    shared::{
        geo::{Coordinate, Distance},
        time::{Duration, Time, Weekday, SECS_PER_DAY},
    },
    walking_router::{directions_with_timeout, WalkingRouter},
};

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub departure: Time,
    pub bus_arrival_time: Time,
    pub total_duration: Duration,
    pub eta: Time,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusLegSummary {
    pub route: String,
    pub headsign: String,
    pub board_stop: String,
    pub alight_stop: String,
    pub board_time: Time,
    pub alight_time: Time,
}

#[derive(Debug, Clone, Serialize)]
pub enum Itinerary {
    WalkOnly {
        distance: Distance,
        duration: Duration,
        eta: Time,
        walking_steps: Option<Vec<String>>,
        next_bus: Option<BusLegSummary>,
    },
    Direct {
        route: String,
        headsign: String,
        summary: Summary,
        legs: Vec<BusLegSummary>,
    },
    Transfer {
        legs: Vec<BusLegSummary>,
        summary: Summary,
    },
}

fn bus_legs(repo: &Repository, path: &[Step]) -> Vec<BusLegSummary> {
    path.iter()
        .filter_map(|step| match step {
            Step::Bus {
                route_idx,
                headsign,
                board_stop,
                alight_stop,
                board_time,
                alight_time,
                ..
            } => Some(BusLegSummary {
                route: repo.route_by_idx(*route_idx).name.to_string(),
                headsign: headsign.to_string(),
                board_stop: repo.stop_by_idx(*board_stop).name.to_string(),
                alight_stop: repo.stop_by_idx(*alight_stop).name.to_string(),
                board_time: *board_time,
                alight_time: *alight_time,
            }),
            Step::Walk { .. } => None,
        })
        .collect()
}

fn total_distance(path: &[Step]) -> Distance {
    path.iter()
        .filter_map(|s| match s {
            Step::Walk { distance, .. } => Some(*distance),
            Step::Bus { .. } => None,
        })
        .fold(Distance::from_meters(0.0), |a, b| a + b)
}

/// Elapsed time from `(query_time, query_day)` to `(eta, eta_day)`, aware of
/// the day rollover `astar::search` already resolved. Plain `Time` subtraction
/// only holds within a single day — an `eta` that crossed midnight relative
/// to the query needs `eta_day`'s forward day-count folded in, or it
/// underflows.
fn elapsed_across_days(query_time: Time, query_day: Weekday, eta: Time, eta_day: Weekday) -> Duration {
    let days_forward = query_day.days_until(eta_day);
    let secs = days_forward * SECS_PER_DAY + eta.as_seconds() - query_time.as_seconds();
    Duration::from_seconds(secs)
}

fn total_walk_duration(path: &[Step]) -> Duration {
    path.iter()
        .filter_map(|s| match s {
            Step::Walk { duration, .. } => Some(*duration),
            Step::Bus { .. } => None,
        })
        .fold(Duration::ZERO, |a, b| a + b)
}

/// Builds the final response from a completed A* path. Classifies by the
/// number of bus legs — zero is WALK_ONLY, one is DIRECT, two or more is
/// TRANSFER — and concurrently requests turn-by-turn enrichment for the
/// first and last walk segments, tolerating collaborator failure.
pub async fn build(
    repo: &Repository,
    query_time: Time,
    query_day: Weekday,
    result: &SearchResult,
    router: &dyn WalkingRouter,
) -> Itinerary {
    let legs = bus_legs(repo, &result.path);

    if legs.is_empty() {
        let distance = total_distance(&result.path);
        let duration = total_walk_duration(&result.path);
        let walking_steps = enrich_walk(repo, &result.path, router).await;
        return Itinerary::WalkOnly {
            distance,
            duration,
            eta: result.eta,
            walking_steps,
            next_bus: None,
        };
    }

    let total_duration = elapsed_across_days(query_time, query_day, result.eta, result.eta_day);
    let bus_arrival_time = legs.last().map(|l| l.alight_time).unwrap_or(result.eta);
    let summary = Summary {
        departure: legs.first().map(|l| l.board_time).unwrap_or(query_time),
        bus_arrival_time,
        total_duration,
        eta: result.eta,
    };

    if legs.len() == 1 {
        Itinerary::Direct {
            route: legs[0].route.clone(),
            headsign: legs[0].headsign.clone(),
            summary,
            legs,
        }
    } else {
        Itinerary::Transfer { legs, summary }
    }
}

fn point_coordinate(repo: &Repository, point: &Point) -> Coordinate {
    match point {
        Point::Coordinate(c) => *c,
        Point::Stop(idx) => repo.stop_by_idx(*idx).coordinate,
    }
}

/// Enriches the leading/trailing walk legs with turn-by-turn directions,
/// concurrently, tolerating a missing or timed-out collaborator response.
/// Interior walk legs (between two stops, mid-transfer) are left as-is —
/// their distance is short enough that the static estimate suffices.
async fn enrich_walk(repo: &Repository, path: &[Step], router: &dyn WalkingRouter) -> Option<Vec<String>> {
    let leading = match path.first() {
        Some(Step::Walk { from, to, .. }) => Some((point_coordinate(repo, from), point_coordinate(repo, to))),
        _ => None,
    };
    let trailing = if path.len() > 1 {
        match path.last() {
            Some(Step::Walk { from, to, .. }) => Some((point_coordinate(repo, from), point_coordinate(repo, to))),
            _ => None,
        }
    } else {
        None
    };

    let (leading, trailing) = tokio::join!(
        async {
            match leading {
                Some((from, to)) => directions_with_timeout(router, from, to).await,
                None => None,
            }
        },
        async {
            match trailing {
                Some((from, to)) => directions_with_timeout(router, from, to).await,
                None => None,
            }
        }
    );

    let mut steps = Vec::new();
    if let Some(d) = leading {
        steps.extend(d.steps);
    }
    if let Some(d) = trailing {
        steps.extend(d.steps);
    }
    (!steps.is_empty()).then_some(steps)
}

/// `§4.5` item 1: below `walk_only_threshold_m` with no imminent bus,
/// short-circuit straight to a walk-only response without running the
/// full search.
pub fn should_short_circuit(
    repo: &Repository,
    tuning: &Tuning,
    origin: Coordinate,
    dest: Coordinate,
    query_time: Time,
    query_day: Weekday,
) -> bool {
    let dist = origin.network_distance(&dest).as_meters();
    if dist > tuning.walk_only_threshold_m {
        return false;
    }

    let nearby = repo.stops_by_coordinate(origin, tuning.max_walk_origin_m);
    let imminent = nearby.iter().any(|(stop, _)| {
        repo.routes_serving_stop(stop.index).iter().any(|(_, service)| {
            crate::schedule::next_departure_at(repo, service.trip_idx, service.stop_index, query_day, query_time)
                .is_some_and(|d| d.wait <= Duration::from_minutes(10))
        })
    });

    !imminent
}

/// Builds a plain walk-only itinerary without attempting the bus search —
/// used both by the short-circuit path and by `NoPath` degradation.
pub async fn walk_only(
    repo: &Repository,
    tuning: &Tuning,
    origin: Coordinate,
    dest: Coordinate,
    query_time: Time,
    query_day: Weekday,
    router: &dyn WalkingRouter,
) -> Itinerary {
    let distance = origin.network_distance(&dest);
    let walk_speed_m_s = tuning.walk_speed_kmh * 1000.0 / 3600.0;
    let duration = Duration::from_seconds((distance.as_meters() / walk_speed_m_s).round() as u32);
    let (eta, _) = query_time.add_wrapping(duration);

    let next_bus = repo
        .stops_by_coordinate(origin, tuning.max_walk_origin_m)
        .into_iter()
        .filter_map(|(stop, _)| {
            repo.routes_serving_stop(stop.index).iter().find_map(|(route_idx, service)| {
                crate::schedule::next_departure_any_day(
                    repo,
                    service.trip_idx,
                    service.stop_index,
                    query_day,
                    query_time,
                )
                .map(|d| {
                    let trip = repo.trip_by_idx(service.trip_idx);
                    BusLegSummary {
                        route: repo.route_by_idx(*route_idx).name.to_string(),
                        headsign: trip.headsign.to_string(),
                        board_stop: stop.name.to_string(),
                        alight_stop: stop.name.to_string(),
                        board_time: d.trip_start_time,
                        alight_time: d.arrival,
                    }
                })
            })
        })
        .min_by_key(|b| b.board_time);

    let walking_steps = directions_with_timeout(router, origin, dest)
        .await
        .map(|d| d.steps);

    Itinerary::WalkOnly {
        distance,
        duration,
        eta,
        walking_steps,
        next_bus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{astar, model::load::load_repository, walking_router::NullWalkingRouter};

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
                            "days": ["monday", "tuesday", "wednesday", "thursday", "friday"],
                            "trips": [
                                {"headsign": "To KDOJ", "stops_sequence": ["KP1", "CP", "KDOJ"], "times": ["08:00", "16:00"]}
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

    #[tokio::test]
    async fn walk_only_reports_no_bus_legs() {
        let repo = repo();
        let tuning = Tuning::default();
        let router = NullWalkingRouter;
        let origin = Coordinate { latitude: 3.1201, longitude: 101.6544 };
        let dest = Coordinate { latitude: 3.1202, longitude: 101.6545 };
        let result = walk_only(&repo, &tuning, origin, dest, Time::from_hm("07:00").unwrap(), Weekday::Monday, &router).await;
        match result {
            Itinerary::WalkOnly { .. } => {}
            _ => panic!("expected WalkOnly"),
        }
    }

    #[tokio::test]
    async fn direct_classification_for_single_bus_leg() {
        let repo = repo();
        let tuning = Tuning::default();
        let router = NullWalkingRouter;
        let origin = repo.stop_by_id("KP1").unwrap().coordinate;
        let dest = repo.stop_by_id("KDOJ").unwrap().coordinate;
        let result = astar::search(
            &repo,
            &tuning,
            origin,
            dest,
            Time::from_hm("07:55").unwrap(),
            Weekday::Monday,
            astar::RankMode::Scheduled,
        )
        .expect("a path should be found");
        let itinerary = build(&repo, Time::from_hm("07:55").unwrap(), Weekday::Monday, &result, &router).await;
        match itinerary {
            Itinerary::Direct { .. } => {}
            other => panic!("expected Direct, got {other:?}"),
        }
    }

    #[test]
    fn elapsed_across_days_accounts_for_a_midnight_rollover() {
        let total_duration = elapsed_across_days(
            Time::from_hm("23:50").unwrap(),
            Weekday::Monday,
            Time::from_hm("00:30").unwrap(),
            Weekday::Tuesday,
        );
        assert_eq!(total_duration, Duration::from_minutes(40));
    }

    #[test]
    fn elapsed_across_days_same_day_matches_plain_subtraction() {
        let total_duration = elapsed_across_days(
            Time::from_hm("07:30").unwrap(),
            Weekday::Monday,
            Time::from_hm("07:35").unwrap(),
            Weekday::Monday,
        );
        assert_eq!(total_duration, Duration::from_minutes(5));
    }
}
