use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthDto {
    dataset_loaded: bool,
    data_dir: String,
    stop_count: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let repository = state.repository.read().await;
    let dto = HealthDto {
        dataset_loaded: repository.is_some(),
        data_dir: state.data_dir.display().to_string(),
        stop_count: repository.as_ref().map(|r| r.stops().len()).unwrap_or(0),
    };
    Json(dto)
}
