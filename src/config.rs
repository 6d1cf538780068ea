use crate::shared::time::Duration;

/// Calibration constants for the pathfinder and its surrounding layers.
///
/// Every literal named in the planning engine's component design lives here,
/// not scattered through `astar`/`discovery`/`location`, so a deployment can
/// retune the network's walking reluctance or transfer hubs without touching
/// search code. Mirrors the teacher's `gtfs::Config` in spirit: a single
/// struct with a `Default` impl holding every magic number.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Walking speed used for continuous walk edges.
    pub walk_speed_kmh: f32,
    /// Heuristic bus speed; must stay an upper bound on real bus speed for
    /// the A* heuristic to remain admissible.
    pub bus_speed_kmh: f32,
    /// Max walking radius for first-mile boarding stop candidates, meters.
    pub max_walk_origin_m: f32,
    /// Max walking radius for last-mile alighting stop candidates, meters.
    pub max_walk_dest_m: f32,
    /// Max inter-stop walking distance considered during a transfer, meters.
    pub transfer_walk_limit_m: f32,
    /// Max allowed `arrivalTime - queryTime`, in minutes.
    pub search_horizon: Duration,
    /// Reluctance multiplier applied to the first-mile walk penalty.
    pub initial_walk_reluctance: f32,
    /// Reluctance multiplier applied to an unavoidable final walk away from
    /// a stop that could otherwise have served the destination directly.
    pub final_walk_reluctance: f32,
    /// Reluctance multiplier applied to inter-stop transfer walking.
    pub walk_reluctance_factor: f32,
    /// Flat penalty added when switching routes.
    pub transfer_penalty: Duration,
    /// Flat penalty added per boarding.
    pub bus_board_penalty: Duration,
    /// Per-segment penalty while remaining on the same trip.
    pub same_route_hop_penalty: Duration,
    /// Extra flat penalty when a transfer also requires walking to a
    /// different stop.
    pub transfer_walk_penalty: Duration,
    /// Multiplier (<1) applied to the initial walk penalty when the
    /// candidate boarding stop has a direct route towards the destination.
    pub direct_to_dest_bonus: f32,
    /// Hard ceiling on open-set size; beyond this the search degrades to
    /// "best incumbent so far" instead of growing unboundedly.
    pub max_open_set: usize,

    /// Below this great-circle distance, short-circuit straight to a
    /// WALK_ONLY itinerary.
    pub walk_only_threshold_m: f32,
    /// Radius used when looking for an alternate, nearby bus stop.
    pub alternative_stop_radius_m: f32,
    /// Radius used by [`crate::location::nearest_stops`] more generally.
    pub max_walking_from_stop_m: f32,
    /// The fixed set of hub stop ids through which transfers are attempted.
    /// Changing this set changes which transfer itineraries are reachable.
    pub transfer_points: Vec<String>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            walk_speed_kmh: 5.0,
            bus_speed_kmh: 40.0,
            max_walk_origin_m: 800.0,
            max_walk_dest_m: 800.0,
            transfer_walk_limit_m: 300.0,
            search_horizon: Duration::from_minutes(120),
            initial_walk_reluctance: 10.0,
            final_walk_reluctance: 100.0,
            walk_reluctance_factor: 3.0,
            transfer_penalty: Duration::from_minutes(10),
            bus_board_penalty: Duration::from_minutes(2),
            same_route_hop_penalty: Duration::from_seconds(48), // 0.8 min
            transfer_walk_penalty: Duration::from_minutes(2),
            direct_to_dest_bonus: 0.35,
            max_open_set: 4_000,

            walk_only_threshold_m: 500.0,
            alternative_stop_radius_m: 500.0,
            max_walking_from_stop_m: 800.0,
            transfer_points: vec![
                "CP".to_string(),
                "KTC".to_string(),
                "AM".to_string(),
                "KRP".to_string(),
            ],
        }
    }
}
