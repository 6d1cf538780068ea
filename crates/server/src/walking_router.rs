//! A `reqwest`-backed [`WalkingRouter`] — the one concrete implementation of
//! the core's external collaborator boundary. Mirrors the teacher's
//! `api::gtfs::fetch_url` in its `reqwest::Client` usage, but calls a JSON
//! directions API instead of downloading a GTFS feed.

use async_trait::async_trait;
use hopper::shared::geo::{Coordinate, Distance};
use hopper::shared::time::Duration;
use hopper::walking_router::{WalkingDirections, WalkingRouter};
use serde::Deserialize;
use tracing::warn;

pub struct ReqwestWalkingRouter {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestWalkingRouter {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    distance_m: f32,
    duration_s: u32,
    steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    distances_m: Vec<f32>,
}

#[async_trait]
impl WalkingRouter for ReqwestWalkingRouter {
    async fn directions(&self, from: Coordinate, to: Coordinate) -> Option<WalkingDirections> {
        let url = format!("{}/directions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("from_lat", from.latitude),
                ("from_lon", from.longitude),
                ("to_lat", to.latitude),
                ("to_lon", to.longitude),
            ])
            .send()
            .await
            .inspect_err(|err| warn!(%err, "walking directions request failed"))
            .ok()?;

        let body: DirectionsResponse = response
            .json()
            .await
            .inspect_err(|err| warn!(%err, "walking directions response was not valid JSON"))
            .ok()?;

        Some(WalkingDirections {
            distance: Distance::from_meters(body.distance_m),
            duration: Duration::from_seconds(body.duration_s),
            steps: body.steps,
        })
    }

    async fn matrix(&self, from: Coordinate, to: &[Coordinate]) -> Option<Vec<Distance>> {
        let url = format!("{}/matrix", self.base_url);
        let destinations: Vec<String> = to.iter().map(|c| format!("{},{}", c.latitude, c.longitude)).collect();
        let response = self
            .client
            .get(&url)
            .query(&[("from", format!("{},{}", from.latitude, from.longitude)), ("to", destinations.join("|"))])
            .send()
            .await
            .inspect_err(|err| warn!(%err, "walking matrix request failed"))
            .ok()?;

        let body: MatrixResponse = response
            .json()
            .await
            .inspect_err(|err| warn!(%err, "walking matrix response was not valid JSON"))
            .ok()?;

        Some(body.distances_m.into_iter().map(Distance::from_meters).collect())
    }
}
