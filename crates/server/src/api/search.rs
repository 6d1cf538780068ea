use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::{
    dto::{LocationSearchDto, StopDto},
    state::AppState,
};

fn count_param(params: &HashMap<String, String>) -> Result<usize, StatusCode> {
    match params.get("count") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(5),
    }
}

pub async fn search_stops(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(repository) = &*state.repository.read().await else {
        warn!("search requested before a dataset was loaded");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let query = params.get("q").ok_or(StatusCode::BAD_REQUEST)?;
    let count = count_param(&params)?;

    let results: Vec<_> = repository
        .search_stops_by_name(query)
        .into_iter()
        .take(count)
        .map(StopDto::from)
        .collect();
    Ok(Json(results).into_response())
}

pub async fn search_locations(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(repository) = &*state.repository.read().await else {
        warn!("search requested before a dataset was loaded");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let query = params.get("q").ok_or(StatusCode::BAD_REQUEST)?;
    let count = count_param(&params)?;

    let results: Vec<_> = repository
        .search_locations_by_name(query)
        .into_iter()
        .take(count)
        .map(LocationSearchDto::from)
        .collect();
    Ok(Json(results).into_response())
}
