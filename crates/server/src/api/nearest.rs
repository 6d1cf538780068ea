use std::{collections::HashMap, str::FromStr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hopper::{
    location::{nearest_stops, NearestStopMode},
    shared::geo::Coordinate,
};
use tracing::warn;

use crate::{dto::StopDto, state::AppState};

pub async fn nearest(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(repository) = &*state.repository.read().await else {
        warn!("nearest-stop lookup requested before a dataset was loaded");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let query = params.get("q").ok_or(StatusCode::BAD_REQUEST)?;
    let point = Coordinate::from_str(query).map_err(|_| StatusCode::BAD_REQUEST)?;
    let count: usize = match params.get("count") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => 5,
    };
    let refine = params.get("refine").map(String::as_str) == Some("true");
    let mode = if refine { NearestStopMode::Refined } else { NearestStopMode::GreatCircle };

    let results = nearest_stops(repository, point, count, mode, state.router.as_ref(), &state.nearest_stop_cache).await;
    let dtos: Vec<_> = results.into_iter().map(|(stop, _)| StopDto::from(stop)).collect();
    Ok(Json(dtos).into_response())
}
