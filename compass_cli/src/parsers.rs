use clap::ValueEnum;
use compass_core::latlng::LatLng;
use compass_travel_providers::{
    graphhopper_api::GraphHopperProfile, time_of_day::TimeOfDaySelection,
    travel_provider::TravelProvider,
};
use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(millis) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_millis(millis.abs()));
    }

    Err(String::from("Invalid duration"))
}

pub fn parse_latlng(input: &str) -> Result<LatLng, String> {
    input.parse::<LatLng>().map_err(|error| error.to_string())
}

pub fn parse_time_of_day(input: &str) -> Result<TimeOfDaySelection, String> {
    input.parse::<TimeOfDaySelection>()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Straight line with a detour factor at a fixed speed
    Crow,
    /// GraphHopper routing API, needs GRAPHHOPPER_API_KEY
    Graphhopper,
}

impl ProviderArg {
    pub fn into_provider(self) -> TravelProvider {
        match self {
            ProviderArg::Crow => TravelProvider::default(),
            ProviderArg::Graphhopper => TravelProvider::GraphHopperApi {
                profile: GraphHopperProfile::Car,
            },
        }
    }
}
