//! Campus shuttle trip planning core.
//!
//! [`plan`] is the single entry point: it resolves origin/destination
//! (C4), decides whether a walk-only short circuit applies, runs the A*
//! search (C6) when it doesn't, and hands the result to the itinerary
//! builder (C7). Everything underneath is synchronous and I/O-free except
//! the walking-router collaborator calls, which are bounded by timeout.

pub mod astar;
pub mod config;
pub mod discovery;
pub mod error;
pub mod itinerary;
pub mod location;
pub mod model;
pub mod schedule;
pub mod shared;
pub mod walking_router;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    astar::RankMode,
    config::Tuning,
    error::PlanError,
    itinerary::Itinerary,
    location::{resolve_location, Resolved},
    model::Repository,
    shared::{geo::Coordinate, time::Time, time::Weekday},
    walking_router::WalkingRouter,
};

/// Request-time options layered on top of [`Tuning`]'s static defaults.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub query_time: Time,
    pub query_day: Weekday,
    pub rank_mode: RankMode,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            query_time: Time::now(),
            query_day: Time::today(),
            rank_mode: RankMode::Scheduled,
        }
    }
}

/// Plans a trip from `origin` to `destination`. Both are resolved through
/// [`resolve_location`]'s cascade — an exact id, a case-insensitive name, or
/// a fuzzy match, in that order — so callers can pass a stop id, a named
/// building, or free text.
#[instrument(skip(repo, tuning, router))]
pub async fn plan(
    repo: &Repository,
    tuning: &Tuning,
    origin: &str,
    destination: &str,
    options: PlanOptions,
    router: &dyn WalkingRouter,
) -> Result<Itinerary, PlanError> {
    let origin_resolved = resolve_origin(repo, origin)?;
    let dest_resolved = resolve_location(repo, destination)?;

    let origin_point = origin_resolved.coordinate();
    let dest_point = dest_resolved.coordinate();

    if itinerary::should_short_circuit(
        repo,
        tuning,
        origin_point,
        dest_point,
        options.query_time,
        options.query_day,
    ) {
        info!("short-circuiting to a walk-only itinerary");
        return Ok(itinerary::walk_only(
            repo,
            tuning,
            origin_point,
            dest_point,
            options.query_time,
            options.query_day,
            router,
        )
        .await);
    }

    let result = astar::search(
        repo,
        tuning,
        origin_point,
        dest_point,
        options.query_time,
        options.query_day,
        options.rank_mode,
    );

    match result {
        Some(result) => Ok(itinerary::build(repo, options.query_time, options.query_day, &result, router).await),
        None => {
            info!("no path found within the search horizon, degrading to a walk-only estimate");
            Ok(itinerary::walk_only(
                repo,
                tuning,
                origin_point,
                dest_point,
                options.query_time,
                options.query_day,
                router,
            )
            .await)
        }
    }
}

/// A GPS point has no identity to resolve, so the origin cascade is
/// slightly different from the destination cascade: a raw `"lat,lon"`
/// string is accepted before falling back to [`resolve_location`].
fn resolve_origin<'a>(repo: &'a Repository, origin: &str) -> Result<Resolved<'a>, PlanError> {
    if let Ok(coordinate) = origin.parse::<Coordinate>() {
        return Ok(synthetic_origin(coordinate));
    }
    resolve_location(repo, origin).map_err(|_| PlanError::OriginNotFound(origin.to_string()))
}

/// Wraps a bare coordinate with no backing [`crate::model::Stop`] or
/// [`crate::model::Location`] row. Leaked once per call — origins are one
/// per request, never stored, so this trades a tiny one-shot allocation for
/// not needing a lifetime-free `Resolved` variant.
fn synthetic_origin(coordinate: Coordinate) -> Resolved<'static> {
    let location: &'static crate::model::entities::Location = Box::leak(Box::new(crate::model::entities::Location {
        index: u32::MAX,
        id: Arc::from("origin"),
        name: Arc::from("origin"),
        normalized_name: Arc::from("origin"),
        coordinate,
        elevation_m: None,
        nearest_stop_idx: None,
        category: crate::model::entities::LocationCategory::Other,
    }));
    Resolved::Location(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::load::load_repository, walking_router::NullWalkingRouter};

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
    async fn plans_a_direct_ride_from_stop_to_stop() {
        let repo = repo();
        let tuning = Tuning::default();
        let router = NullWalkingRouter;
        let options = PlanOptions {
            query_time: Time::from_hm("07:55").unwrap(),
            query_day: Weekday::Monday,
            rank_mode: RankMode::Scheduled,
        };
        let itinerary = plan(&repo, &tuning, "KP1", "KDOJ", options, &router).await.unwrap();
        assert!(matches!(itinerary, Itinerary::Direct { .. }));
    }

    #[tokio::test]
    async fn unknown_destination_is_an_error() {
        let repo = repo();
        let tuning = Tuning::default();
        let router = NullWalkingRouter;
        let options = PlanOptions {
            query_time: Time::from_hm("07:55").unwrap(),
            query_day: Weekday::Monday,
            rank_mode: RankMode::Scheduled,
        };
        let err = plan(&repo, &tuning, "KP1", "nowhere at all", options, &router)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::DestinationNotFound(_)));
    }

    #[tokio::test]
    async fn gps_origin_resolves_without_a_backing_stop() {
        let repo = repo();
        let tuning = Tuning::default();
        let router = NullWalkingRouter;
        let options = PlanOptions {
            query_time: Time::from_hm("07:55").unwrap(),
            query_day: Weekday::Monday,
            rank_mode: RankMode::Scheduled,
        };
        let itinerary = plan(&repo, &tuning, "3.1201,101.6544", "KDOJ", options, &router)
            .await
            .unwrap();
        assert!(matches!(itinerary, Itinerary::Direct { .. } | Itinerary::WalkOnly { .. }));
    }
}
