//! The schedule oracle (C3): converts trip start times and per-stop offsets
//! into concrete arrival/departure times, applies service-day filtering and
//! the Friday blackout, and rolls forward across days when today's service
//! has already finished.

use crate::{
    model::{entities::Trip, Repository},
    shared::time::{Duration, Time, Weekday},
};

/// `[12:40, 14:00)` — no trip may be reported as a valid Friday departure
/// inside this window, even for an intermediate stop whose arrival merely
/// falls inside it while boarding happened earlier.
const FRIDAY_BLACKOUT_START: Time = Time::from_seconds(12 * 3600 + 40 * 60);
const FRIDAY_BLACKOUT_END: Time = Time::from_seconds(14 * 3600);

fn in_friday_blackout(day: Weekday, arrival: Time) -> bool {
    day.is_friday() && arrival >= FRIDAY_BLACKOUT_START && arrival < FRIDAY_BLACKOUT_END
}

/// Sums per-segment durations up to `target_index`. The *only* place in the
/// codebase allowed to compute a trip offset (§9 resolved open question) —
/// every offset is backed by `route_durations` coverage checked at load
/// time, never guessed here.
pub fn dynamic_offset(trip: &Trip, target_index: usize) -> Duration {
    trip.offsets[target_index]
}

/// A concrete, schedule-filtered departure.
#[derive(Debug, Clone, Copy)]
pub struct Departure {
    pub trip_idx: u32,
    pub stop_index: usize,
    pub trip_start_time: Time,
    pub arrival: Time,
    pub wait: Duration,
    pub day: Weekday,
    /// How many days past `query_day` this departure falls on.
    pub days_forward: u32,
}

/// `nextDepartureAt`: first scheduled arrival at `stop_index` on `query_day`
/// at or after `query_time`, or `None` if the trip doesn't run that day, or
/// every remaining departure lands in the Friday blackout.
pub fn next_departure_at(
    repo: &Repository,
    trip_idx: u32,
    stop_index: usize,
    query_day: Weekday,
    query_time: Time,
) -> Option<Departure> {
    let trip = repo.trip_by_idx(trip_idx);
    let service = service_for_trip(repo, trip_idx)?;
    if !service.runs_on(query_day) {
        return None;
    }

    let offset = dynamic_offset(trip, stop_index);
    trip.times
        .iter()
        .filter_map(|&start| {
            let arrival = start + offset;
            if in_friday_blackout(query_day, arrival) {
                return None;
            }
            (arrival >= query_time).then_some((start, arrival))
        })
        .min_by_key(|&(_, arrival)| arrival)
        .map(|(start, arrival)| Departure {
            trip_idx,
            stop_index,
            trip_start_time: start,
            arrival,
            wait: arrival - query_time,
            day: query_day,
            days_forward: 0,
        })
}

/// `nextDepartureAnyDay`: searches forward up to 7 days, starting at
/// `query_day`/`query_time`, then midnight on each subsequent day.
pub fn next_departure_any_day(
    repo: &Repository,
    trip_idx: u32,
    stop_index: usize,
    query_day: Weekday,
    query_time: Time,
) -> Option<Departure> {
    if let Some(d) = next_departure_at(repo, trip_idx, stop_index, query_day, query_time) {
        return Some(d);
    }

    let mut day = query_day.succ();
    for days_forward in 1..7u32 {
        if let Some(mut d) = next_departure_at(repo, trip_idx, stop_index, day, Time::from_seconds(0))
        {
            d.days_forward = days_forward;
            return Some(d);
        }
        day = day.succ();
    }
    None
}

fn service_for_trip<'a>(repo: &'a Repository, trip_idx: u32) -> Option<&'a crate::model::entities::Service> {
    let trip = repo.trip_by_idx(trip_idx);
    repo.services_of_route(trip.route_idx)
        .find(|s| s.trip_idxs.contains(&trip_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::load::load_repository;

    fn repo() -> Repository {
        let schedule = r#"{
            "stops": [
                {"id": "KP1", "name": "KP1", "lat": 3.1201, "lon": 101.6544},
                {"id": "CP", "name": "Central Plaza", "lat": 3.1230, "lon": 101.6560},
                {"id": "KDOJ", "name": "KDOJ", "lat": 3.1260, "lon": 101.6590}
            ],
            "routes": [
                {
                    "name": "Route A",
                    "services": [
                        {
                            "service_id": "weekday",
                            "days": ["monday", "tuesday", "wednesday", "thursday", "friday"],
                            "trips": [
                                {
                                    "headsign": "To KDOJ",
                                    "stops_sequence": ["KP1", "CP", "KDOJ"],
                                    "times": ["08:00", "12:30", "16:00"]
                                }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let durations = r#"{
            "Route A_To KDOJ": {
                "segments": [
                    {"from_stop_id": "KP1", "to_stop_id": "CP", "total_secs": 300},
                    {"from_stop_id": "CP", "to_stop_id": "KDOJ", "total_secs": 420}
                ]
            }
        }"#;
        load_repository(schedule, r#"{"locations": []}"#, durations, None).unwrap()
    }

    #[test]
    fn next_departure_finds_first_matching() {
        let repo = repo();
        let trip = repo.trips()[0].index;
        let dep = next_departure_at(&repo, trip, 0, Weekday::Monday, Time::from_hm("07:00").unwrap())
            .unwrap();
        assert_eq!(dep.trip_start_time, Time::from_hm("08:00").unwrap());
        assert_eq!(dep.wait, Duration::from_minutes(60));
    }

    #[test]
    fn wrong_service_day_yields_none() {
        let repo = repo();
        let trip = repo.trips()[0].index;
        assert!(next_departure_at(&repo, trip, 0, Weekday::Saturday, Time::from_hm("07:00").unwrap())
            .is_none());
    }

    #[test]
    fn friday_blackout_skips_midday_trip() {
        let repo = repo();
        let trip = repo.trips()[0].index;
        // The 12:30 start arrives at KDOJ (offset 12min) at 12:42, inside
        // [12:40, 14:00) — it must be skipped in favor of the 16:00 start.
        let dep = next_departure_at(&repo, trip, 2, Weekday::Friday, Time::from_hm("12:00").unwrap())
            .unwrap();
        assert_eq!(dep.trip_start_time, Time::from_hm("16:00").unwrap());
    }

    #[test]
    fn any_day_rolls_forward_past_last_departure() {
        let repo = repo();
        let trip = repo.trips()[0].index;
        let dep =
            next_departure_any_day(&repo, trip, 0, Weekday::Friday, Time::from_hm("23:00").unwrap())
                .unwrap();
        assert!(dep.days_forward >= 1);
    }

    #[test]
    fn zero_wait_at_exact_departure() {
        let repo = repo();
        let trip = repo.trips()[0].index;
        let dep = next_departure_at(&repo, trip, 0, Weekday::Monday, Time::from_hm("08:00").unwrap())
            .unwrap();
        assert_eq!(dep.wait, Duration::ZERO);
    }
}
