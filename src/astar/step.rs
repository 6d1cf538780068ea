use crate::{
    model::entities::Headsign,
    shared::{
        geo::{Coordinate, Distance},
        time::{Duration, Time},
    },
};

/// Either endpoint of a [`Step`]: a stop in the static network, or a bare
/// coordinate (only ever the very start or end of a path).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Point {
    Coordinate(Coordinate),
    Stop(u32),
}

/// One edge of a search path. A tagged variant rather than a dynamically
/// dispatched or dict-shaped step (§9 redesign note) — the itinerary
/// builder matches on this directly.
#[derive(Debug, Clone)]
pub enum Step {
    Walk {
        from: Point,
        to: Point,
        distance: Distance,
        duration: Duration,
        penalty: Duration,
    },
    Bus {
        route_idx: u32,
        headsign: Headsign,
        trip_idx: u32,
        board_stop: u32,
        alight_stop: u32,
        board_time: Time,
        alight_time: Time,
        penalty: Duration,
    },
}

impl Step {
    pub fn duration(&self) -> Duration {
        match self {
            Step::Walk { duration, .. } => *duration,
            Step::Bus { board_time, alight_time, .. } => *alight_time - *board_time,
        }
    }
}
