pub mod entities;
pub mod load;

pub use entities::*;

use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;

use crate::shared::{
    geo::{Cell, Coordinate},
    search, Identifiable,
};

/// Upper bound on the radius a grid-cell span can be sized for, in meters.
/// Well past any campus network's extent; exists only so an "unbounded"
/// caller (`radius_m = f32::MAX`) can't overflow the cell-span arithmetic.
const MAX_GRID_SEARCH_RADIUS_M: f32 = 50_000.0;

/// A route's serving of one stop: which trip, and at what index in that
/// trip's stop sequence. Backs `routesByStop`.
#[derive(Debug, Clone, Copy)]
pub struct StopService {
    pub trip_idx: u32,
    pub stop_index: usize,
}

/// A route geometry, attached only for itinerary-response enrichment.
/// Absent geometries degrade gracefully — no shape, itinerary unaffected.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    pub points: Arc<[Coordinate]>,
}

/// The flattened, read-only, process-wide static data store (C2). Built
/// once at load time (or dataset reload) and shared behind an `Arc` by
/// every concurrent `plan()` call; no mutation after construction.
///
/// Mirrors the teacher's `repository::Repository`: `Box<[T]>` for entity
/// collections, `HashMap<Arc<str>, u32>` id lookups, and adjacency-list
/// indices built once so request-time queries never scan.
#[derive(Debug)]
pub struct Repository {
    stops: Box<[Stop]>,
    locations: Box<[Location]>,
    routes: Box<[Route]>,
    services: Box<[Service]>,
    trips: Box<[Trip]>,

    stop_lookup: HashMap<Arc<str>, u32>,
    location_lookup: HashMap<Arc<str>, u32>,
    location_name_lookup: HashMap<String, Vec<u32>>,
    stop_name_lookup: HashMap<String, Vec<u32>>,
    route_lookup: HashMap<Arc<str>, u32>,

    /// `stopsById` → every (route, trip, index-in-trip) serving that stop.
    routes_by_stop: Box<[Vec<(u32, StopService)>]>,
    /// `tripsByRoute`.
    trips_by_route: Box<[Vec<u32>]>,

    /// Spatial hash over stop coordinates for nearest-stop prefiltering.
    stop_cells: HashMap<Cell, Vec<u32>>,

    /// `(route_idx, headsign) -> geometry`, used only by the itinerary
    /// builder for response enrichment.
    geometries: HashMap<(u32, Arc<str>), RouteGeometry>,
}

impl Repository {
    pub(crate) fn build(
        stops: Vec<Stop>,
        locations: Vec<Location>,
        routes: Vec<Route>,
        services: Vec<Service>,
        trips: Vec<Trip>,
        geometries: HashMap<(u32, Arc<str>), RouteGeometry>,
    ) -> Self {
        let stop_lookup = stops.iter().map(|s| (s.id.clone(), s.index)).collect();
        let location_lookup = locations
            .iter()
            .map(|l| (l.id.clone(), l.index))
            .collect();

        let mut location_name_lookup: HashMap<String, Vec<u32>> = HashMap::new();
        for l in &locations {
            location_name_lookup
                .entry(l.normalized_name.to_string())
                .or_default()
                .push(l.index);
        }
        let mut stop_name_lookup: HashMap<String, Vec<u32>> = HashMap::new();
        for s in &stops {
            stop_name_lookup
                .entry(s.normalized_name.to_string())
                .or_default()
                .push(s.index);
        }

        let route_lookup = routes.iter().map(|r| (r.name.clone(), r.index)).collect();

        let mut routes_by_stop: Vec<Vec<(u32, StopService)>> = vec![Vec::new(); stops.len()];
        let mut trips_by_route: Vec<Vec<u32>> = vec![Vec::new(); routes.len()];
        for trip in &trips {
            trips_by_route[trip.route_idx as usize].push(trip.index);
            for (stop_index, &stop_idx) in trip.stops_sequence.iter().enumerate() {
                routes_by_stop[stop_idx as usize].push((
                    trip.route_idx,
                    StopService {
                        trip_idx: trip.index,
                        stop_index,
                    },
                ));
            }
        }

        let mut stop_cells: HashMap<Cell, Vec<u32>> = HashMap::new();
        for s in &stops {
            stop_cells.entry(s.coordinate.to_cell()).or_default().push(s.index);
        }

        Self {
            stops: stops.into_boxed_slice(),
            locations: locations.into_boxed_slice(),
            routes: routes.into_boxed_slice(),
            services: services.into_boxed_slice(),
            trips: trips.into_boxed_slice(),
            stop_lookup,
            location_lookup,
            location_name_lookup,
            stop_name_lookup,
            route_lookup,
            routes_by_stop: routes_by_stop.into_boxed_slice(),
            trips_by_route: trips_by_route.into_boxed_slice(),
            stop_cells,
            geometries,
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        self.stop_lookup.get(id).map(|&idx| &self.stops[idx as usize])
    }

    pub fn stop_by_idx(&self, idx: u32) -> &Stop {
        &self.stops[idx as usize]
    }

    pub fn location_by_id(&self, id: &str) -> Option<&Location> {
        self.location_lookup
            .get(id)
            .map(|&idx| &self.locations[idx as usize])
    }

    pub fn location_by_idx(&self, idx: u32) -> &Location {
        &self.locations[idx as usize]
    }

    pub fn locations_by_name(&self, name: &str) -> Vec<&Location> {
        self.location_name_lookup
            .get(&name.to_lowercase())
            .into_iter()
            .flatten()
            .map(|&idx| &self.locations[idx as usize])
            .collect()
    }

    pub fn stops_by_name(&self, name: &str) -> Vec<&Stop> {
        self.stop_name_lookup
            .get(&name.to_lowercase())
            .into_iter()
            .flatten()
            .map(|&idx| &self.stops[idx as usize])
            .collect()
    }

    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.route_lookup
            .get(name)
            .map(|&idx| &self.routes[idx as usize])
    }

    pub fn route_by_idx(&self, idx: u32) -> &Route {
        &self.routes[idx as usize]
    }

    pub fn trip_by_idx(&self, idx: u32) -> &Trip {
        &self.trips[idx as usize]
    }

    pub fn service_by_idx(&self, idx: u32) -> &Service {
        &self.services[idx as usize]
    }

    pub fn trips_of_route(&self, route_idx: u32) -> impl Iterator<Item = &Trip> {
        self.trips_by_route[route_idx as usize]
            .iter()
            .map(|&idx| &self.trips[idx as usize])
    }

    pub fn services_of_route(&self, route_idx: u32) -> impl Iterator<Item = &Service> {
        self.routes[route_idx as usize]
            .service_idxs
            .iter()
            .map(|&idx| &self.services[idx as usize])
    }

    /// Every `(route, trip, index-in-trip)` serving `stop_idx` — `routesByStop`.
    pub fn routes_serving_stop(&self, stop_idx: u32) -> &[(u32, StopService)] {
        &self.routes_by_stop[stop_idx as usize]
    }

    pub fn geometry(&self, route_idx: u32, headsign: &str) -> Option<&RouteGeometry> {
        self.geometries.get(&(route_idx, Arc::from(headsign)))
    }

    /// Stops within `radius` of `point`, sorted nearest-first. Prefilters
    /// via the spatial grid hash, then exact-distances only the candidates,
    /// mirroring the teacher's `stops_by_coordinate`.
    ///
    /// `radius_m` is clamped to [`MAX_GRID_SEARCH_RADIUS_M`] before sizing the
    /// cell span: callers like [`crate::location::nearest_stops`] pass
    /// `f32::MAX` to mean "unbounded", and scaling that by a cell size before
    /// casting to `i32` would saturate and then overflow on the following
    /// `+ 1`. The clamp is far larger than any campus network, so it never
    /// changes which stops are found — only how big an unbounded query is
    /// allowed to claim its radius is.
    pub fn stops_by_coordinate(&self, point: Coordinate, radius_m: f32) -> Vec<(&Stop, f32)> {
        let center = point.to_cell();
        let bounded_radius_m = radius_m.min(MAX_GRID_SEARCH_RADIUS_M);
        let span = (bounded_radius_m / crate::shared::geo::AVERAGE_STOP_DISTANCE.as_meters()).ceil() as i32 + 1;

        let mut candidates: Vec<u32> = Vec::new();
        for dx in -span..=span {
            for dy in -span..=span {
                if let Some(ids) = self.stop_cells.get(&(center.0 + dx, center.1 + dy)) {
                    candidates.extend(ids.iter().copied());
                }
            }
        }

        let mut results: Vec<(&Stop, f32)> = candidates
            .par_iter()
            .filter_map(|&idx| {
                let stop = &self.stops[idx as usize];
                let dist = point.network_distance(&stop.coordinate).as_meters();
                (dist <= radius_m).then_some((stop, dist))
            })
            .collect();
        results.par_sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        results
    }

    /// Fuzzy text search over stop names (autocomplete, `resolveLocation`
    /// cascade's final stage).
    pub fn search_stops_by_name<'a>(&'a self, needle: &'a str) -> Vec<&'a Stop> {
        search(needle, &self.stops)
    }

    pub fn search_locations_by_name<'a>(&'a self, needle: &'a str) -> Vec<&'a Location> {
        search(needle, &self.locations)
    }
}
