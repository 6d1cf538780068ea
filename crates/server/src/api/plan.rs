use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hopper::{
    astar::RankMode,
    error::PlanError,
    location::{resolve_location, Resolved},
    shared::time::{Time, Weekday},
    PlanOptions,
};
use tracing::warn;

use crate::{
    dto::{LocationDto, PlanResponseDto},
    state::AppState,
};

pub async fn plan(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(repository) = &*state.repository.read().await else {
        warn!("plan requested before a dataset was loaded");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let from = params.get("from").ok_or(StatusCode::BAD_REQUEST)?;
    let to = params.get("to").ok_or(StatusCode::BAD_REQUEST)?;

    let query_time = match params.get("time") {
        Some(t) => Time::from_hm(t).ok_or(StatusCode::BAD_REQUEST)?,
        None => Time::now(),
    };
    let query_day = match params.get("day") {
        Some(d) => parse_weekday(d).ok_or(StatusCode::BAD_REQUEST)?,
        None => Time::today(),
    };
    let rank_mode = match params.get("mode").map(String::as_str) {
        Some("anytime") => RankMode::Anytime,
        Some("scheduled") | None => RankMode::Scheduled,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let options = PlanOptions {
        query_time,
        query_day,
        rank_mode,
    };

    let itinerary = hopper::plan(repository, &state.tuning, from, to, options, state.router.as_ref())
        .await
        .map_err(plan_error_status)?;

    // `hopper::plan` resolves the origin/destination internally; resolve
    // them again here purely to echo a display name back to the caller.
    let origin_dto = match resolve_location(repository, from) {
        Ok(resolved) => LocationDto::from(&resolved),
        Err(_) => LocationDto {
            name: from.clone(),
            coordinate: from.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        },
    };
    let destination_resolved: Resolved<'_> = resolve_location(repository, to).map_err(|_| StatusCode::BAD_REQUEST)?;
    let destination_dto = LocationDto::from(&destination_resolved);

    let dto = PlanResponseDto {
        origin: origin_dto,
        destination: destination_dto,
        itinerary,
    };

    Ok(Json(dto).into_response())
}

fn parse_weekday(value: &str) -> Option<Weekday> {
    match value.to_lowercase().as_str() {
        "monday" => Some(Weekday::Monday),
        "tuesday" => Some(Weekday::Tuesday),
        "wednesday" => Some(Weekday::Wednesday),
        "thursday" => Some(Weekday::Thursday),
        "friday" => Some(Weekday::Friday),
        "saturday" => Some(Weekday::Saturday),
        "sunday" => Some(Weekday::Sunday),
        _ => None,
    }
}

fn plan_error_status(err: PlanError) -> StatusCode {
    match err {
        PlanError::DestinationNotFound(_) | PlanError::OriginNotFound(_) | PlanError::OriginMissing => {
            StatusCode::BAD_REQUEST
        }
        PlanError::NoPath | PlanError::NoService => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
