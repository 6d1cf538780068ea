use serde::{Deserialize, Serialize};
use std::{
    cmp,
    fmt::Display,
    iter::Sum,
    ops::{Add, Div, Mul, Sub},
    str::FromStr,
};
use thiserror::Error;

/// Grid cell key used by the spatial hash in [`crate::model::Repository`].
pub type Cell = (i32, i32);

pub(crate) const AVERAGE_STOP_DISTANCE: Distance = Distance::from_meters(500.0);
pub(crate) const LONGITUDE_DISTANCE: Distance = Distance::from_meters(111_320.0);
pub(crate) const LATITUDE_DISTANCE: Distance = Distance::from_meters(110_540.0);

#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f32);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Distance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f32> for Distance {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<f32> for Distance {
    type Output = Self;
    fn div(self, rhs: f32) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl From<f32> for Distance {
    fn from(value: f32) -> Self {
        Distance(value)
    }
}

impl Distance {
    pub const fn from_meters(distance: f32) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f32) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f32 {
        self.0
    }

    pub const fn as_kilometers(&self) -> f32 {
        self.0 / 1000.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f32,
    pub longitude: f32,
}

impl Sum for Coordinate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut count: usize = 0;
        let mut lat: f32 = 0.0;
        let mut lon: f32 = 0.0;
        iter.for_each(|coordinate| {
            count += 1;
            lat += coordinate.latitude;
            lon += coordinate.longitude;
        });
        let count = count as f32;
        Self {
            latitude: lat / count,
            longitude: lon / count,
        }
    }
}

impl From<Coordinate> for (f32, f32) {
    fn from(value: Coordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

#[derive(Error, Debug)]
pub enum ParseCoordinateError {
    #[error("invalid latitude")]
    InvalidLatitude,
    #[error("invalid longitude")]
    InvalidLongitude,
    #[error("invalid format, expected \"lat,lon\"")]
    InvalidFormat,
}

impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(',') {
            return Err(ParseCoordinateError::InvalidFormat);
        }
        let s: String = s.split_whitespace().collect();
        let split: Vec<_> = s.split(',').collect();
        let latitude: f32 = split
            .first()
            .ok_or(ParseCoordinateError::InvalidLatitude)?
            .parse()
            .map_err(|_| ParseCoordinateError::InvalidLatitude)?;
        let longitude: f32 = split
            .last()
            .ok_or(ParseCoordinateError::InvalidLongitude)?
            .parse()
            .map_err(|_| ParseCoordinateError::InvalidLongitude)?;
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }
}

impl Coordinate {
    /// Great-circle (haversine) distance. Admissible for the A* heuristic:
    /// never overestimates true network distance.
    pub fn euclidean_distance(&self, coord: &Self) -> Distance {
        const R: f32 = 6371.0;
        let dist_lat = f32::to_radians(coord.latitude - self.latitude);
        let dist_lon = f32::to_radians(coord.longitude - self.longitude);
        let a = f32::powi(f32::sin(dist_lat / 2.0), 2)
            + f32::cos(f32::to_radians(self.latitude))
                * f32::cos(f32::to_radians(coord.latitude))
                * f32::sin(dist_lon / 2.0)
                * f32::sin(dist_lon / 2.0);
        let c = 2.0 * f32::atan2(f32::sqrt(a), f32::sqrt(1.0 - a));
        Distance::from_kilometers(R * c)
    }

    /// Great-circle distance inflated by a fixed circuity factor, used as a
    /// walking-distance estimate when no routed path is available.
    pub fn network_distance(&self, coord: &Self) -> Distance {
        const CIRCUITY_FACTOR: f32 = 1.3;
        Distance::from_meters(self.euclidean_distance(coord).as_meters() * CIRCUITY_FACTOR)
    }

    pub fn to_cell(&self) -> Cell {
        let x = (self.longitude * LONGITUDE_DISTANCE.as_meters()
            / AVERAGE_STOP_DISTANCE.as_meters()) as i32;
        let y = (self.latitude * LATITUDE_DISTANCE.as_meters() / AVERAGE_STOP_DISTANCE.as_meters())
            as i32;
        (x, y)
    }
}

/// Total length of a polyline, used when attaching route geometries to an
/// itinerary response (§10.6 of the plan).
pub fn polyline_length(points: &[Coordinate]) -> Distance {
    points
        .windows(2)
        .map(|pair| pair[0].euclidean_distance(&pair[1]))
        .fold(Distance::from_meters(0.0), Add::add)
}

#[test]
fn distance_eq_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b)
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}

#[test]
fn coordinate_parse() {
    let c = Coordinate::from_str("3.1201, 101.6544").unwrap();
    assert_eq!(c.latitude, 3.1201);
    assert_eq!(c.longitude, 101.6544);
}

#[test]
fn coordinate_parse_rejects_missing_comma() {
    assert!(Coordinate::from_str("3.1201 101.6544").is_err());
}

#[test]
fn polyline_length_sums_segments() {
    let a = Coordinate { latitude: 3.1201, longitude: 101.6544 };
    let b = Coordinate { latitude: 3.1211, longitude: 101.6544 };
    let c = Coordinate { latitude: 3.1221, longitude: 101.6544 };
    let whole = polyline_length(&[a, b, c]);
    let half = a.euclidean_distance(&b);
    assert!(whole.as_meters() > half.as_meters());
}

#[test]
fn to_cell_neighbors_are_close() {
    let a = Coordinate { latitude: 3.1201, longitude: 101.6544 };
    let b = Coordinate { latitude: 3.1202, longitude: 101.6545 };
    assert_eq!(a.to_cell(), b.to_cell());
}
