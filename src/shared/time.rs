use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use chrono::{Datelike, Local, Timelike};

/// Seconds since local midnight, `[0, 86_400)` under normal construction.
/// Cross-midnight arithmetic is expressed explicitly (see [`Time::add_wrapping`])
/// rather than baked into `Add`, so callers can't silently lose the day rollover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(u32);

pub(crate) const SECS_PER_DAY: u32 = 24 * 60 * 60;

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hms_string())
    }
}

impl Time {
    pub fn now() -> Self {
        let now = Local::now();
        Self(now.num_seconds_from_midnight())
    }

    pub fn today() -> Weekday {
        Weekday::from_chrono(Local::now().weekday())
    }

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub const fn as_minutes(&self) -> u32 {
        self.0 / 60
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{h:02}:{m:02}:{s:02}")
    }

    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next().map(|s| s.parse().ok()).unwrap_or(Some(0))?;
        Some(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }

    /// Parses a bare `HH:MM` trip-start string, as used in the schedule dataset.
    pub fn from_hm(time: &str) -> Option<Self> {
        let mut split = time.split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        Some(Self(hours * 3600 + minutes * 60))
    }

    /// Adds a duration, wrapping past midnight, and reports how many full
    /// days were crossed. Used by the schedule oracle's day rollover search.
    pub fn add_wrapping(&self, rhs: Duration) -> (Self, u32) {
        let total = self.0 + rhs.0;
        (Self(total % SECS_PER_DAY), total / SECS_PER_DAY)
    }
}

/// The seven service days a [`crate::model::Service`] may run on. Distinct
/// from [`chrono::Weekday`] because the schedule oracle needs a Friday-only
/// blackout rule and a 7-day forward rollover that has nothing to do with
/// ISO week numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn succ(&self) -> Self {
        match self {
            Weekday::Monday => Weekday::Tuesday,
            Weekday::Tuesday => Weekday::Wednesday,
            Weekday::Wednesday => Weekday::Thursday,
            Weekday::Thursday => Weekday::Friday,
            Weekday::Friday => Weekday::Saturday,
            Weekday::Saturday => Weekday::Sunday,
            Weekday::Sunday => Weekday::Monday,
        }
    }

    pub const fn is_friday(&self) -> bool {
        matches!(self, Weekday::Friday)
    }

    pub fn advance(&self, days: u32) -> Self {
        let mut day = *self;
        for _ in 0..days {
            day = day.succ();
        }
        day
    }

    /// How many `succ()` steps forward from `self` land on `other`, in
    /// `[0, 6]`. Used to turn an `(eta, eta_day)` pair back into an elapsed
    /// duration against a query day without a subtraction operator on
    /// `Weekday` itself.
    pub fn days_until(&self, other: Weekday) -> u32 {
        let mut day = *self;
        let mut count = 0;
        while day != other {
            day = day.succ();
            count += 1;
        }
        count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const ZERO: Self = Self(0);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self(hours * 60 * 60)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub const fn as_minutes_f64(&self) -> f64 {
        self.0 as f64 / 60.0
    }

    /// Rounds to the nearest whole minute, matching the schedule oracle's
    /// minute-granularity offsets (`dynamicOffset`).
    pub fn round_to_minute(&self) -> Self {
        Self::from_minutes((self.0 + 30) / 60)
    }

    /// Scales a duration by a reluctance/multiplier factor, rounding to the
    /// nearest second. Used throughout the pathfinder's penalty math.
    pub fn scale(&self, factor: f32) -> Self {
        Self(((self.0 as f32) * factor).round() as u32)
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

#[test]
fn parse_unparse_1() {
    let time = "00:00:00";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_5() {
    let time = "12:30:30";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn from_hm_matches_hms() {
    assert_eq!(Time::from_hm("16:05").unwrap(), Time::from_hms("16:05:00").unwrap());
}

#[test]
fn from_hm_rejects_seconds() {
    assert!(Time::from_hm("16:05:00").is_none());
}

#[test]
fn invalid_time_test_1() {
    let time = "00:00:0a";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn add_wrapping_stays_same_day() {
    let t = Time::from_hm("23:00").unwrap();
    let (result, days) = t.add_wrapping(Duration::from_minutes(30));
    assert_eq!(result, Time::from_hm("23:30").unwrap());
    assert_eq!(days, 0);
}

#[test]
fn add_wrapping_crosses_midnight() {
    let t = Time::from_hm("23:30").unwrap();
    let (result, days) = t.add_wrapping(Duration::from_minutes(45));
    assert_eq!(result, Time::from_hm("00:15").unwrap());
    assert_eq!(days, 1);
}

#[test]
fn weekday_succ_wraps() {
    assert_eq!(Weekday::Sunday.succ(), Weekday::Monday);
}
