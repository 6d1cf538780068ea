use hopper::itinerary::Itinerary;
use serde::Serialize;

use super::LocationDto;

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponseDto {
    pub origin: LocationDto,
    pub destination: LocationDto,
    pub itinerary: Itinerary,
}
