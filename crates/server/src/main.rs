mod api;
mod dto;
mod state;
mod walking_router;

use std::{env, path::PathBuf, sync::Arc, time::Instant};

use axum::routing::get;
use hopper::{config::Tuning, location::NearestStopCache, model::load::load_repository};
use tokio::{fs, sync::RwLock};
use tracing::{error, info, warn};

use crate::{state::AppState, walking_router::ReqwestWalkingRouter};

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();
    info!("starting hopper-server");

    let data_dir = match env::var("CAMPUS_DATA_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(err) => {
            warn!("CAMPUS_DATA_PATH not set ({err}), starting with no dataset loaded");
            PathBuf::new()
        }
    };

    let directions_base_url =
        env::var("WALKING_ROUTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let app_state = AppState {
        repository: RwLock::new(load_dataset(&data_dir).await),
        tuning: Tuning::default(),
        router: Arc::new(ReqwestWalkingRouter::new(directions_base_url)),
        nearest_stop_cache: NearestStopCache::new(),
        data_dir,
    };

    let app = axum::Router::new()
        .route("/plan", get(api::plan))
        .route("/search/stops", get(api::search_stops))
        .route("/search/locations", get(api::search_locations))
        .route("/nearest", get(api::nearest))
        .route("/health", get(api::health))
        .with_state(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{PORT}")).await.unwrap();
    info!("listening on port {PORT}");
    axum::serve(listener, app).await.unwrap();
}

/// Loads the four dataset files from `data_dir` if present. A missing or
/// malformed dataset is logged and degrades to "no repository loaded"
/// rather than aborting the process — `/plan` then answers 503 until an
/// operator fixes the data and restarts.
async fn load_dataset(data_dir: &PathBuf) -> Option<hopper::model::Repository> {
    if data_dir.as_os_str().is_empty() {
        return None;
    }

    let schedule = fs::read_to_string(data_dir.join("schedule.json")).await;
    let locations = fs::read_to_string(data_dir.join("locations.json")).await;
    let durations = fs::read_to_string(data_dir.join("route_durations.json")).await;
    let geometries = fs::read_to_string(data_dir.join("geometries.json")).await.ok();

    let (schedule, locations, durations) = match (schedule, locations, durations) {
        (Ok(s), Ok(l), Ok(d)) => (s, l, d),
        _ => {
            warn!(dir = %data_dir.display(), "dataset files not found, starting with no dataset loaded");
            return None;
        }
    };

    let start = Instant::now();
    match load_repository(&schedule, &locations, &durations, geometries.as_deref()) {
        Ok(repo) => {
            info!(elapsed = ?start.elapsed(), stops = repo.stops().len(), "dataset loaded");
            Some(repo)
        }
        Err(err) => {
            error!(%err, "failed to load dataset");
            None
        }
    }
}
