//! The boundary to the external walking router (§6): an optional turn-by-
//! turn directions provider and a walking-distance matrix. A concrete,
//! HTTP-backed implementation is ambient server-crate wiring — see the
//! `hopper-server` binary's `reqwest`-based adapter — not core logic. The
//! core only needs the trait and bounded-timeout call discipline.

use std::time::Duration as StdDuration;

use async_trait::async_trait;

use crate::shared::geo::{Coordinate, Distance};
use crate::shared::time::Duration;

#[derive(Debug, Clone)]
pub struct WalkingDirections {
    pub distance: Distance,
    pub duration: Duration,
    pub steps: Vec<String>,
}

/// Collaborator interface the planning core requires but does not
/// implement. Both methods tolerate "no route" by returning `None`; the
/// core then falls back to great-circle distance estimates.
#[async_trait]
pub trait WalkingRouter: Send + Sync {
    async fn directions(&self, from: Coordinate, to: Coordinate) -> Option<WalkingDirections>;
    async fn matrix(&self, from: Coordinate, to: &[Coordinate]) -> Option<Vec<Distance>>;
}

/// Always returns `None`. Keeps the planning core fully testable and
/// I/O-free by default; production wiring swaps this for a real adapter.
#[derive(Debug, Default)]
pub struct NullWalkingRouter;

#[async_trait]
impl WalkingRouter for NullWalkingRouter {
    async fn directions(&self, _from: Coordinate, _to: Coordinate) -> Option<WalkingDirections> {
        None
    }

    async fn matrix(&self, _from: Coordinate, _to: &[Coordinate]) -> Option<Vec<Distance>> {
        None
    }
}

/// Default bounded timeouts for collaborator calls (§5).
pub const DIRECTIONS_TIMEOUT: StdDuration = StdDuration::from_secs(5);
pub const MATRIX_TIMEOUT: StdDuration = StdDuration::from_secs(5);
pub const WALK_TIME_TIMEOUT: StdDuration = StdDuration::from_secs(2);

/// Calls `router.directions`, degrading silently to `None` on timeout.
pub async fn directions_with_timeout(
    router: &dyn WalkingRouter,
    from: Coordinate,
    to: Coordinate,
) -> Option<WalkingDirections> {
    tokio::time::timeout(DIRECTIONS_TIMEOUT, router.directions(from, to))
        .await
        .unwrap_or(None)
}

/// Calls `router.matrix`, degrading silently to `None` on timeout.
pub async fn matrix_with_timeout(
    router: &dyn WalkingRouter,
    from: Coordinate,
    to: &[Coordinate],
) -> Option<Vec<Distance>> {
    tokio::time::timeout(MATRIX_TIMEOUT, router.matrix(from, to))
        .await
        .unwrap_or(None)
}
