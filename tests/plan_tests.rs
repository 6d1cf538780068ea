//! End-to-end scenarios over a small synthetic campus network, exercising
//! `hopper::plan` the way a caller at the HTTP boundary would.

use hopper::{
    astar::{self, RankMode},
    config::Tuning,
    itinerary::Itinerary,
    model::load::load_repository,
    model::Repository,
    shared::time::{Time, Weekday},
    walking_router::NullWalkingRouter,
    PlanOptions,
};

/// KP1 — CP — KTC — KDOJ on Route A (weekday service), CP — KTC — FKT on
/// Route B (weekday service), and KLG feeding into the CP hub on Route C
/// (Thursday-only). AM is an isolated stop with no nearby routes, standing
/// in for a destination reachable only on foot.
fn campus_repository() -> Repository {
    let schedule = r#"{
        "stops": [
            {"id": "KP1", "name": "KP1", "lat": 3.1201, "lon": 101.6544},
            {"id": "CP", "name": "Central Plaza", "lat": 3.1230, "lon": 101.6560},
            {"id": "KTC", "name": "KTC", "lat": 3.1245, "lon": 101.6575},
            {"id": "KDOJ", "name": "KDOJ", "lat": 3.1260, "lon": 101.6590},
            {"id": "FKT", "name": "FKT", "lat": 3.1300, "lon": 101.6620},
            {"id": "KLG", "name": "KLG", "lat": 3.1215, "lon": 101.6520},
            {"id": "AM", "name": "AM", "lat": 3.1900, "lon": 101.7200}
        ],
        "routes": [
            {
                "name": "Route A",
                "services": [
                    {
                        "service_id": "weekday",
                        "days": ["monday", "tuesday", "wednesday", "thursday", "friday"],
                        "trips": [
                            {"headsign": "To KDOJ", "stops_sequence": ["KP1", "CP", "KTC", "KDOJ"], "times": ["07:00", "07:30", "08:00", "13:00", "14:05", "16:00"]}
                        ]
                    }
                ]
            },
            {
                "name": "Route B",
                "services": [
                    {
                        "service_id": "weekday",
                        "days": ["monday", "tuesday", "wednesday", "thursday", "friday"],
                        "trips": [
                            {"headsign": "To FKT", "stops_sequence": ["CP", "KTC", "FKT"], "times": ["07:15", "07:45", "08:15"]}
                        ]
                    }
                ]
            },
            {
                "name": "Route C",
                "services": [
                    {
                        "service_id": "thursday-only",
                        "days": ["thursday"],
                        "trips": [
                            {"headsign": "To CP", "stops_sequence": ["KLG", "CP"], "times": ["07:50"]}
                        ]
                    }
                ]
            }
        ]
    }"#;
    let locations = r#"{
        "locations": [
            {"id": "arked-meranti", "name": "Arked Meranti", "lat": 3.1901, "lon": 101.7201, "nearest_stop": "AM", "category": "amenity"}
        ]
    }"#;
    let durations = r#"{
        "Route A_To KDOJ": {
            "segments": [
                {"from_stop_id": "KP1", "to_stop_id": "CP", "total_secs": 300},
                {"from_stop_id": "CP", "to_stop_id": "KTC", "total_secs": 300},
                {"from_stop_id": "KTC", "to_stop_id": "KDOJ", "total_secs": 300}
            ]
        },
        "Route B_To FKT": {
            "segments": [
                {"from_stop_id": "CP", "to_stop_id": "KTC", "total_secs": 300},
                {"from_stop_id": "KTC", "to_stop_id": "FKT", "total_secs": 420}
            ]
        },
        "Route C_To CP": {
            "segments": [
                {"from_stop_id": "KLG", "to_stop_id": "CP", "total_secs": 360}
            ]
        }
    }"#;
    load_repository(schedule, locations, durations, None).unwrap()
}

fn options(time: &str, day: Weekday) -> PlanOptions {
    PlanOptions {
        query_time: Time::from_hm(time).unwrap(),
        query_day: day,
        rank_mode: RankMode::Scheduled,
    }
}

#[tokio::test]
async fn short_walk_beats_the_bus() {
    let repo = campus_repository();
    let tuning = Tuning::default();
    let router = NullWalkingRouter;

    // A GPS point a few meters from Arked Meranti, with no bus stop within
    // walking range at all — the short-circuit must fire regardless of
    // what the schedule looks like.
    let itinerary = hopper::plan(
        &repo,
        &tuning,
        "3.19015,101.72005",
        "Arked Meranti",
        options("10:00", Weekday::Monday),
        &router,
    )
    .await
    .unwrap();

    match itinerary {
        Itinerary::WalkOnly { distance, .. } => assert!(distance.as_meters() < 300.0),
        other => panic!("expected WalkOnly, got {other:?}"),
    }
}

#[tokio::test]
async fn direct_line_prime_time() {
    let repo = campus_repository();
    let tuning = Tuning::default();
    let router = NullWalkingRouter;

    let itinerary = hopper::plan(&repo, &tuning, "KP1", "CP", options("07:30", Weekday::Monday), &router)
        .await
        .unwrap();

    match itinerary {
        Itinerary::Direct { route, legs, summary, .. } => {
            assert_eq!(route, "Route A");
            assert_eq!(legs.len(), 1);
            assert_eq!(summary.departure, Time::from_hm("07:30").unwrap());
            assert_eq!(summary.bus_arrival_time, Time::from_hm("07:35").unwrap());
        }
        other => panic!("expected Direct, got {other:?}"),
    }
}

#[tokio::test]
async fn transfer_via_hub() {
    let repo = campus_repository();
    let tuning = Tuning::default();
    let router = NullWalkingRouter;

    // KLG has no route to FKT; Route C (Thursday only) feeds CP, and
    // Route B continues from CP onward to FKT.
    let itinerary = hopper::plan(&repo, &tuning, "KLG", "FKT", options("07:45", Weekday::Thursday), &router)
        .await
        .unwrap();

    match itinerary {
        Itinerary::Transfer { legs, .. } => {
            assert_eq!(legs.len(), 2);
            assert_eq!(legs[0].alight_stop, "Central Plaza");
            assert_eq!(legs[1].board_stop, "Central Plaza");
            assert_ne!(legs[0].route, legs[1].route);
            assert_eq!(legs[1].alight_stop, "FKT");
        }
        other => panic!("expected Transfer, got {other:?}"),
    }
}

#[tokio::test]
async fn friday_blackout_skips_midday_arrival() {
    let repo = campus_repository();
    let tuning = Tuning::default();
    let router = NullWalkingRouter;

    // The 13:00 start from KP1 falls inside the [12:40, 14:00) Friday
    // blackout, so it must never be offered — the engine should skip ahead
    // to the 14:05 start instead.
    let itinerary = hopper::plan(&repo, &tuning, "KP1", "CP", options("12:45", Weekday::Friday), &router)
        .await
        .unwrap();

    match itinerary {
        Itinerary::Direct { summary, .. } => {
            assert_eq!(summary.departure, Time::from_hm("14:05").unwrap());
        }
        other => panic!("expected Direct, got {other:?}"),
    }
}

#[test]
fn next_day_rollover_when_todays_service_is_exhausted() {
    let repo = campus_repository();
    // An overnight wait is a legitimate, if unusual, search outcome — widen
    // the horizon past the default 120 minutes so the search doesn't prune
    // the only available board before it gets the chance to roll forward.
    let tuning = Tuning {
        search_horizon: hopper::shared::time::Duration::from_minutes(480),
        ..Tuning::default()
    };

    let kp1 = repo.stop_by_id("KP1").unwrap().coordinate;
    let cp = repo.stop_by_id("CP").unwrap().coordinate;

    let result = astar::search(
        &repo,
        &tuning,
        kp1,
        cp,
        Time::from_hm("23:59").unwrap(),
        Weekday::Monday,
        RankMode::Scheduled,
    )
    .expect("Tuesday's service should be found by rolling forward");

    assert_eq!(result.eta_day, Weekday::Tuesday);
}
