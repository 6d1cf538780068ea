use hopper::{location::Resolved, shared::geo::Coordinate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LocationDto {
    pub name: String,
    pub coordinate: Coordinate,
}

impl LocationDto {
    pub fn from(resolved: &Resolved) -> Self {
        Self {
            name: resolved.name().to_string(),
            coordinate: resolved.coordinate(),
        }
    }
}
