use std::{collections::HashMap, sync::Arc, time::Instant};

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::RepositoryError,
    model::{
        entities::{Headsign, Location, LocationCategory, Route, Service, Stop, Trip},
        Repository, RouteGeometry,
    },
    shared::{geo::Coordinate, time::Time, time::Weekday},
};

/// Raw, wire-shaped view of the schedule dataset described in §6 of the
/// plan. Kept separate from the domain types (teacher's `GtfsStop` /
/// `GtfsRoute` pattern in `gtfs::models`) so dataset-shape churn doesn't
/// ripple into the search engine.
#[derive(Debug, Deserialize)]
pub struct RawSchedule {
    pub stops: Vec<RawStop>,
    pub routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
pub struct RawStop {
    pub id: String,
    pub name: String,
    pub lat: f32,
    pub lon: f32,
    pub elevation: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct RawRoute {
    pub name: String,
    #[serde(default)]
    pub is_loop: bool,
    pub services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
pub struct RawService {
    pub service_id: String,
    pub days: Vec<Weekday>,
    pub trips: Vec<RawTrip>,
}

#[derive(Debug, Deserialize)]
pub struct RawTrip {
    pub headsign: String,
    pub stops_sequence: Vec<String>,
    pub times: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawLocations {
    pub locations: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    pub id: String,
    pub name: String,
    pub lat: f32,
    pub lon: f32,
    pub elevation: Option<f32>,
    pub nearest_stop: Option<String>,
    #[serde(default = "default_category")]
    pub category: LocationCategory,
}

fn default_category() -> LocationCategory {
    LocationCategory::Other
}

/// `route_durations`: `"RouteName_Headsign" -> { segments: [...] }`.
#[derive(Debug, Deserialize)]
pub struct RawDurationSegment {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub total_secs: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawDurationEntry {
    pub segments: Vec<RawDurationSegment>,
}

pub type RawDurations = HashMap<String, RawDurationEntry>;

/// `"RouteName : Headsign" -> GeoJSON LineString`.
#[derive(Debug, Deserialize)]
pub struct RawGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

pub type RawGeometries = HashMap<String, RawGeometry>;

fn json_err(what: &str, source: serde_json::Error) -> RepositoryError {
    RepositoryError::Json {
        what: what.to_string(),
        source,
    }
}

/// Loads a [`Repository`] from the four JSON datasets described in §6 of
/// the plan. `geometries_json` is optional — a missing or unparsable
/// geometries document degrades response enrichment only, it never fails
/// the load.
pub fn load_repository(
    schedule_json: &str,
    locations_json: &str,
    durations_json: &str,
    geometries_json: Option<&str>,
) -> Result<Repository, RepositoryError> {
    let start = Instant::now();

    let schedule: RawSchedule =
        serde_json::from_str(schedule_json).map_err(|e| json_err("schedule dataset", e))?;
    let raw_locations: RawLocations =
        serde_json::from_str(locations_json).map_err(|e| json_err("locations dataset", e))?;
    let durations: RawDurations =
        serde_json::from_str(durations_json).map_err(|e| json_err("route_durations", e))?;

    let stops = load_stops(schedule.stops);
    debug!(count = stops.len(), elapsed = ?start.elapsed(), "loaded stops");

    let stop_lookup: HashMap<&str, u32> = stops.iter().map(|s| (s.id.as_ref(), s.index)).collect();

    let locations = load_locations(raw_locations.locations, &stop_lookup)?;
    debug!(count = locations.len(), elapsed = ?start.elapsed(), "loaded locations");

    let (routes, services, trips) = load_routes(schedule.routes, &stop_lookup, &durations)?;
    debug!(
        routes = routes.len(),
        services = services.len(),
        trips = trips.len(),
        elapsed = ?start.elapsed(),
        "loaded routes/services/trips"
    );

    let route_lookup: HashMap<&str, u32> = routes.iter().map(|r| (r.name.as_ref(), r.index)).collect();

    let geometries = match geometries_json {
        Some(json) => match serde_json::from_str::<RawGeometries>(json) {
            Ok(raw) => load_geometries(raw, &route_lookup),
            Err(err) => {
                tracing::warn!(%err, "failed to parse route geometries, continuing without them");
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };

    debug!(elapsed = ?start.elapsed(), "repository build complete");
    Ok(Repository::build(
        stops, locations, routes, services, trips, geometries,
    ))
}

fn load_stops(raw: Vec<RawStop>) -> Vec<Stop> {
    raw.into_iter()
        .enumerate()
        .map(|(i, s)| Stop {
            index: i as u32,
            id: Arc::from(s.id.as_str()),
            name: Arc::from(s.name.as_str()),
            normalized_name: Arc::from(s.name.to_lowercase().as_str()),
            coordinate: Coordinate {
                latitude: s.lat,
                longitude: s.lon,
            },
            elevation_m: s.elevation,
        })
        .collect()
}

fn load_locations(
    raw: Vec<RawLocation>,
    stop_lookup: &HashMap<&str, u32>,
) -> Result<Vec<Location>, RepositoryError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, l)| {
            let nearest_stop_idx = match l.nearest_stop {
                Some(ref stop_id) => Some(*stop_lookup.get(stop_id.as_str()).ok_or_else(|| {
                    RepositoryError::DanglingNearestStop {
                        id: l.id.clone(),
                        stop_id: stop_id.clone(),
                    }
                })?),
                None => None,
            };
            Ok(Location {
                index: i as u32,
                id: Arc::from(l.id.as_str()),
                name: Arc::from(l.name.as_str()),
                normalized_name: Arc::from(l.name.to_lowercase().as_str()),
                coordinate: Coordinate {
                    latitude: l.lat,
                    longitude: l.lon,
                },
                elevation_m: l.elevation,
                nearest_stop_idx,
                category: l.category,
            })
        })
        .collect()
}

#[allow(clippy::type_complexity)]
fn load_routes(
    raw_routes: Vec<RawRoute>,
    stop_lookup: &HashMap<&str, u32>,
    durations: &RawDurations,
) -> Result<(Vec<Route>, Vec<Service>, Vec<Trip>), RepositoryError> {
    let mut routes = Vec::with_capacity(raw_routes.len());
    let mut services = Vec::new();
    let mut trips = Vec::new();

    for (route_idx, raw_route) in raw_routes.into_iter().enumerate() {
        let route_idx = route_idx as u32;
        let mut service_idxs = Vec::with_capacity(raw_route.services.len());

        for raw_service in raw_route.services {
            let service_idx = services.len() as u32;
            let mut trip_idxs = Vec::with_capacity(raw_service.trips.len());

            for raw_trip in raw_service.trips {
                let trip_idx = trips.len() as u32;
                let trip = build_trip(
                    trip_idx,
                    route_idx,
                    &raw_route.name,
                    raw_trip,
                    stop_lookup,
                    durations,
                )?;
                trip_idxs.push(trip_idx);
                trips.push(trip);
            }

            services.push(Service {
                index: service_idx,
                route_idx,
                service_id: Arc::from(raw_service.service_id.as_str()),
                days: raw_service.days,
                trip_idxs,
            });
            service_idxs.push(service_idx);
        }

        routes.push(Route {
            index: route_idx,
            name: Arc::from(raw_route.name.as_str()),
            normalized_name: Arc::from(raw_route.name.to_lowercase().as_str()),
            is_loop: raw_route.is_loop,
            service_idxs,
        });
    }

    Ok((routes, services, trips))
}

fn build_trip(
    trip_idx: u32,
    route_idx: u32,
    route_name: &str,
    raw_trip: RawTrip,
    stop_lookup: &HashMap<&str, u32>,
    durations: &RawDurations,
) -> Result<Trip, RepositoryError> {
    let stops_sequence: Vec<u32> = raw_trip
        .stops_sequence
        .iter()
        .map(|id| {
            stop_lookup
                .get(id.as_str())
                .copied()
                .ok_or_else(|| RepositoryError::DanglingStopRef {
                    route: route_name.to_string(),
                    headsign: raw_trip.headsign.clone(),
                    stop_id: id.clone(),
                })
        })
        .collect::<Result<_, _>>()?;

    let times: Vec<Time> = raw_trip
        .times
        .iter()
        .filter_map(|t| Time::from_hm(t))
        .collect();

    let key = format!("{}_{}", route_name, raw_trip.headsign);
    let entry = durations.get(&key);
    let segment_secs: HashMap<(&str, &str), u32> = entry
        .map(|e| {
            e.segments
                .iter()
                .map(|s| ((s.from_stop_id.as_str(), s.to_stop_id.as_str()), s.total_secs))
                .collect()
        })
        .unwrap_or_default();

    let mut offsets = Vec::with_capacity(stops_sequence.len());
    offsets.push(crate::shared::time::Duration::ZERO);
    let mut cumulative = 0u32;
    for window in raw_trip.stops_sequence.windows(2) {
        let secs = *segment_secs.get(&(window[0].as_str(), window[1].as_str())).ok_or_else(|| {
            RepositoryError::MissingDurationCoverage {
                route: route_name.to_string(),
                headsign: raw_trip.headsign.clone(),
                stop_count: stops_sequence.len(),
                segment_count: segment_secs.len(),
            }
        })?;
        cumulative += secs;
        offsets.push(crate::shared::time::Duration::from_seconds(cumulative));
    }

    let stop_membership = stops_sequence.iter().copied().collect();

    Ok(Trip {
        index: trip_idx,
        route_idx,
        headsign: Headsign(Arc::from(raw_trip.headsign.as_str())),
        stops_sequence: Arc::from(stops_sequence.into_boxed_slice()),
        times: Arc::from(times.into_boxed_slice()),
        offsets: Arc::from(offsets.into_boxed_slice()),
        stop_membership: Arc::new(stop_membership),
    })
}

fn load_geometries(
    raw: RawGeometries,
    route_lookup: &HashMap<&str, u32>,
) -> HashMap<(u32, Arc<str>), RouteGeometry> {
    let mut out = HashMap::new();
    for (key, geom) in raw {
        let Some((route_name, headsign)) = key.split_once(" : ") else {
            tracing::warn!(key, "malformed geometry key, expected \"Route : Headsign\"");
            continue;
        };
        let Some(&route_idx) = route_lookup.get(route_name) else {
            tracing::warn!(route_name, "geometry for unknown route, skipping");
            continue;
        };
        let points: Vec<Coordinate> = geom
            .coordinates
            .iter()
            .map(|[lon, lat]| Coordinate {
                latitude: *lat as f32,
                longitude: *lon as f32,
            })
            .collect();
        out.insert(
            (route_idx, Arc::from(headsign)),
            RouteGeometry {
                points: Arc::from(points.into_boxed_slice()),
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (String, String, String) {
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
                                {
                                    "headsign": "To KDOJ",
                                    "stops_sequence": ["KP1", "CP", "KDOJ"],
                                    "times": ["08:00", "08:30", "16:00"]
                                }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let locations = r#"{
            "locations": [
                {"id": "arked-meranti", "name": "Arked Meranti", "lat": 3.1262, "lon": 101.6591, "nearest_stop": "KDOJ", "category": "amenity"}
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
        (schedule.to_string(), locations.to_string(), durations.to_string())
    }

    #[test]
    fn loads_a_minimal_repository() {
        let (schedule, locations, durations) = fixture();
        let repo = load_repository(&schedule, &locations, &durations, None).unwrap();
        assert_eq!(repo.stops().len(), 3);
        assert_eq!(repo.locations().len(), 1);
        let trip = &repo.trips()[0];
        assert_eq!(trip.offsets.len(), 3);
        assert_eq!(trip.offsets[2].as_seconds(), 720);
    }

    #[test]
    fn missing_duration_coverage_is_a_loud_error() {
        let (schedule, locations, _durations) = fixture();
        let err = load_repository(&schedule, &locations, "{}", None).unwrap_err();
        assert!(matches!(err, RepositoryError::MissingDurationCoverage { .. }));
    }

    #[test]
    fn dangling_stop_ref_is_rejected() {
        let schedule = r#"{
            "stops": [{"id": "KP1", "name": "KP1", "lat": 3.12, "lon": 101.65}],
            "routes": [{
                "name": "Route A",
                "services": [{
                    "service_id": "weekday",
                    "days": ["monday"],
                    "trips": [{"headsign": "To Nowhere", "stops_sequence": ["KP1", "GHOST"], "times": ["08:00"]}]
                }]
            }]
        }"#;
        let err = load_repository(schedule, r#"{"locations": []}"#, "{}", None).unwrap_err();
        assert!(matches!(err, RepositoryError::DanglingStopRef { .. }));
    }
}
