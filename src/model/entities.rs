use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::shared::{geo::Coordinate, time::Time, time::Weekday, Identifiable};

/// A physical bus stop. Identity is the short `id`; attributes are
/// immutable once the [`crate::model::Repository`] is built.
#[derive(Debug, Clone)]
pub struct Stop {
    pub index: u32,
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub normalized_name: Arc<str>,
    pub coordinate: Coordinate,
    pub elevation_m: Option<f32>,
}

impl Identifiable for Stop {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
}

/// What kind of thing a [`Location`] names, for display and for ranking the
/// `resolveLocation` cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Academic,
    Residential,
    Amenity,
    Stop,
    Other,
}

/// A named, queryable destination. May or may not coincide with a [`Stop`];
/// when a location id collides with a stop id, [`crate::model::Repository`]
/// exposes the stop as a synthetic bus-stop location (see §3 of the plan).
#[derive(Debug, Clone)]
pub struct Location {
    pub index: u32,
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub normalized_name: Arc<str>,
    pub coordinate: Coordinate,
    pub elevation_m: Option<f32>,
    pub nearest_stop_idx: Option<u32>,
    pub category: LocationCategory,
}

impl Identifiable for Location {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
}

/// A direction label for a [`Trip`], unique within its owning [`Route`].
/// Newtype so the search engine never has to string-match headsigns to
/// decide whether two bus edges belong to the same leg (§9 design note).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Headsign(pub Arc<str>);

impl std::fmt::Display for Headsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Headsign {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// One scheduled run of a route in one direction: a fixed stop sequence,
/// a list of start times, and (via `route_durations`) a cumulative offset
/// table. `trip_stop_set` is pre-built so "is stop X on trip Y" is O(1).
#[derive(Debug, Clone)]
pub struct Trip {
    pub index: u32,
    pub route_idx: u32,
    pub headsign: Headsign,
    pub stops_sequence: Arc<[u32]>,
    pub times: Arc<[Time]>,
    /// `offsets[i]` is the cumulative duration from `stops_sequence[0]` to
    /// `stops_sequence[i]`. `offsets[0] == Duration::ZERO` always.
    pub offsets: Arc<[crate::shared::time::Duration]>,
    /// Pre-built membership set (`tripStopSets`) so "is stop on trip" is
    /// O(1) instead of a scan of `stops_sequence`.
    pub stop_membership: Arc<std::collections::HashSet<u32>>,
}

impl Trip {
    pub fn stop_index_of(&self, stop_idx: u32) -> Option<usize> {
        self.stops_sequence.iter().position(|&s| s == stop_idx)
    }

    pub fn contains_stop(&self, stop_idx: u32) -> bool {
        self.stop_membership.contains(&stop_idx)
    }
}

/// A named subset of a route's trips sharing a common set of service days.
#[derive(Debug, Clone)]
pub struct Service {
    pub index: u32,
    pub route_idx: u32,
    pub service_id: Arc<str>,
    pub days: Vec<Weekday>,
    pub trip_idxs: Vec<u32>,
}

impl Service {
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub index: u32,
    pub name: Arc<str>,
    pub normalized_name: Arc<str>,
    pub is_loop: bool,
    pub service_idxs: Vec<u32>,
}

impl Identifiable for Route {
    fn id(&self) -> &str {
        &self.name
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
}

