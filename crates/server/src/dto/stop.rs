use hopper::{model::entities::Location, model::entities::Stop, shared::geo::Coordinate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDto {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
}

impl StopDto {
    pub fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.to_string(),
            coordinate: stop.coordinate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSearchDto {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub category: String,
}

impl LocationSearchDto {
    pub fn from(location: &Location) -> Self {
        Self {
            id: location.id.to_string(),
            name: location.name.to_string(),
            coordinate: location.coordinate,
            category: format!("{:?}", location.category).to_lowercase(),
        }
    }
}
