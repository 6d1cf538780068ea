use thiserror::Error;

/// Load-time failures. Not request-scoped: these abort dataset construction
/// before a [`crate::model::Repository`] is ever handed to a planner.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("failed to read dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {what} as JSON: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("trip {route}/{headsign} references unknown stop id {stop_id}")]
    DanglingStopRef {
        route: String,
        headsign: String,
        stop_id: String,
    },
    #[error(
        "trip {route}/{headsign} has {stop_count} stops but route_durations only covers {segment_count} segments"
    )]
    MissingDurationCoverage {
        route: String,
        headsign: String,
        stop_count: usize,
        segment_count: usize,
    },
    #[error("location {id} references unknown nearestStop id {stop_id}")]
    DanglingNearestStop { id: String, stop_id: String },
}

/// Request-time failures surfaced by [`crate::plan`].
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("destination not found: {0}")]
    DestinationNotFound(String),
    #[error("origin stop not found: {0}")]
    OriginNotFound(String),
    #[error("no origin was provided (need a GPS point or a stop id)")]
    OriginMissing,
    #[error("no feasible itinerary found within the search horizon")]
    NoPath,
    #[error("no service runs this route in the next 7 days")]
    NoService,
}
