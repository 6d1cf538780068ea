//! Location resolution and the nearest-stop service (C4).

use std::{num::NonZeroUsize, sync::Mutex};

use lru::LruCache;

use crate::{
    error::PlanError,
    model::{entities::Location, entities::Stop, Repository},
    shared::geo::{Coordinate, Distance},
    walking_router::{matrix_with_timeout, WalkingRouter},
};

/// Either a named [`Location`] or a bare [`Stop`] resolved by
/// [`resolve_location`]. Both carry a coordinate and a display name, which
/// is all the pathfinder and itinerary builder need.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Location(&'a Location),
    Stop(&'a Stop),
}

impl<'a> Resolved<'a> {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Resolved::Location(l) => l.coordinate,
            Resolved::Stop(s) => s.coordinate,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Resolved::Location(l) => &l.name,
            Resolved::Stop(s) => &s.name,
        }
    }

    /// The stop this resolves to directly, if any — either because it *is*
    /// a stop, or because the location carries a `nearestStop` hint.
    pub fn stop_idx(&self) -> Option<u32> {
        match self {
            Resolved::Location(l) => l.nearest_stop_idx,
            Resolved::Stop(s) => Some(s.index),
        }
    }
}

/// `resolveLocation`: exact location id → exact stop id → case-insensitive
/// location name → case-insensitive stop name → substring/fuzzy match
/// among stops. Fails with [`PlanError::DestinationNotFound`] if nothing
/// in the cascade matches.
pub fn resolve_location<'a>(repo: &'a Repository, query: &str) -> Result<Resolved<'a>, PlanError> {
    if let Some(location) = repo.location_by_id(query) {
        return Ok(Resolved::Location(location));
    }
    if let Some(stop) = repo.stop_by_id(query) {
        return Ok(Resolved::Stop(stop));
    }
    if let Some(location) = repo.locations_by_name(query).into_iter().next() {
        return Ok(Resolved::Location(location));
    }
    if let Some(stop) = repo.stops_by_name(query).into_iter().next() {
        return Ok(Resolved::Stop(stop));
    }
    if let Some(&stop) = repo.search_stops_by_name(query).first() {
        return Ok(Resolved::Stop(stop));
    }
    Err(PlanError::DestinationNotFound(query.to_string()))
}

/// Whether `nearestStops` should refine its great-circle prefilter with an
/// external walking-distance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearestStopMode {
    GreatCircle,
    Refined,
}

const NEAREST_PREFILTER_COUNT: usize = 10;
const CACHE_CAPACITY: usize = 100;
/// Cache key granularity: 4 decimal places, ~11m at the equator.
const CACHE_ROUNDING: f32 = 10_000.0;

fn cache_key(point: Coordinate) -> (i32, i32) {
    (
        (point.latitude * CACHE_ROUNDING).round() as i32,
        (point.longitude * CACHE_ROUNDING).round() as i32,
    )
}

/// Bounded-LRU cache of resolved nearest-stop sets, keyed by coordinate
/// rounded to 4 decimal places. Replaces the insertion-order-map eviction
/// flagged in §9 with a real LRU, safe for concurrent readers/writers
/// behind a single mutex (§5).
pub struct NearestStopCache {
    inner: Mutex<LruCache<(i32, i32), Vec<(u32, f32)>>>,
}

impl Default for NearestStopCache {
    fn default() -> Self {
        Self {
            inner: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
        }
    }
}

impl NearestStopCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: (i32, i32)) -> Option<Vec<(u32, f32)>> {
        self.inner.lock().unwrap().get(&key).cloned()
    }

    fn put(&self, key: (i32, i32), value: Vec<(u32, f32)>) {
        self.inner.lock().unwrap().put(key, value);
    }
}

/// `nearestStops`: great-circle prefilter to the closest 10 candidates,
/// then (when `mode == Refined`) an external walking-distance matrix call,
/// bounded at ~5s, to re-sort them; falls back silently to the
/// great-circle order on timeout or collaborator failure.
pub async fn nearest_stops<'a>(
    repo: &'a Repository,
    point: Coordinate,
    k: usize,
    mode: NearestStopMode,
    router: &dyn WalkingRouter,
    cache: &NearestStopCache,
) -> Vec<(&'a Stop, Distance)> {
    let key = cache_key(point);
    if let Some(cached) = cache.get(key) {
        return cached
            .into_iter()
            .take(k)
            .map(|(idx, meters)| (repo.stop_by_idx(idx), Distance::from_meters(meters)))
            .collect();
    }

    let prefiltered: Vec<(&Stop, f32)> = repo
        .stops_by_coordinate(point, f32::MAX)
        .into_iter()
        .take(NEAREST_PREFILTER_COUNT)
        .collect();

    let ordered: Vec<(&Stop, f32)> = if mode == NearestStopMode::Refined && !prefiltered.is_empty() {
        let coords: Vec<Coordinate> = prefiltered.iter().map(|(s, _)| s.coordinate).collect();
        match matrix_with_timeout(router, point, &coords).await {
            Some(distances) if distances.len() == prefiltered.len() => {
                let mut refined: Vec<(&Stop, f32)> = prefiltered
                    .iter()
                    .zip(distances)
                    .map(|((stop, _), dist)| (*stop, dist.as_meters()))
                    .collect();
                refined.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
                refined
            }
            _ => prefiltered,
        }
    } else {
        prefiltered
    };

    cache.put(
        key,
        ordered.iter().map(|(s, d)| (s.index, *d)).collect(),
    );

    ordered
        .into_iter()
        .take(k)
        .map(|(s, d)| (s, Distance::from_meters(d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::load::load_repository;

    fn repo() -> Repository {
        let schedule = r#"{
            "stops": [
                {"id": "KP1", "name": "KP1", "lat": 3.1201, "lon": 101.6544},
                {"id": "CP", "name": "Central Plaza", "lat": 3.1230, "lon": 101.6560}
            ],
            "routes": []
        }"#;
        let locations = r#"{
            "locations": [
                {"id": "arked-meranti", "name": "Arked Meranti", "lat": 3.1262, "lon": 101.6591, "nearest_stop": "CP", "category": "amenity"}
            ]
        }"#;
        load_repository(schedule, locations, "{}", None).unwrap()
    }

    #[test]
    fn resolves_exact_location_id() {
        let repo = repo();
        let resolved = resolve_location(&repo, "arked-meranti").unwrap();
        assert_eq!(resolved.name(), "Arked Meranti");
        assert_eq!(resolved.stop_idx(), Some(repo.stop_by_id("CP").unwrap().index));
    }

    #[test]
    fn resolves_exact_stop_id_as_synthetic_location() {
        let repo = repo();
        let resolved = resolve_location(&repo, "KP1").unwrap();
        assert!(matches!(resolved, Resolved::Stop(_)));
    }

    #[test]
    fn resolves_case_insensitive_name() {
        let repo = repo();
        let resolved = resolve_location(&repo, "arked meranti").unwrap();
        assert_eq!(resolved.name(), "Arked Meranti");
    }

    #[test]
    fn unknown_query_fails() {
        let repo = repo();
        assert!(resolve_location(&repo, "nonexistent place").is_err());
    }

    #[tokio::test]
    async fn nearest_stops_prefers_closer_stop() {
        let repo = repo();
        let cache = NearestStopCache::new();
        let router = crate::walking_router::NullWalkingRouter;
        let point = Coordinate { latitude: 3.1202, longitude: 101.6545 };
        let nearest = nearest_stops(&repo, point, 1, NearestStopMode::GreatCircle, &router, &cache).await;
        assert_eq!(nearest[0].0.id.as_ref(), "KP1");
    }
}
