mod itinerary;
mod location;
mod stop;

pub use itinerary::PlanResponseDto;
pub use location::LocationDto;
pub use stop::{LocationSearchDto, StopDto};
