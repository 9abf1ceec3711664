use serde::{Deserialize, Serialize};

use crate::{
    error::TravelError, time_of_day::TimeOfDaySelection, travel_provider::TravelDistanceProvider,
    travel_query::TravelQuery, travel_result::TravelEstimate,
};

/// Multipliers turning the free-flow duration into a traffic duration,
/// one per time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CongestionFactors {
    pub now: f64,
    pub morning: f64,
    pub evening: f64,
    pub weekend: f64,
}

impl Default for CongestionFactors {
    fn default() -> Self {
        Self {
            now: 1.2,
            morning: 1.4,
            evening: 1.5,
            weekend: 1.1,
        }
    }
}

impl CongestionFactors {
    pub fn factor(&self, time_of_day: TimeOfDaySelection) -> f64 {
        match time_of_day {
            TimeOfDaySelection::Now => self.now,
            TimeOfDaySelection::Morning => self.morning,
            TimeOfDaySelection::Evening => self.evening,
            TimeOfDaySelection::Weekend => self.weekend,
        }
    }
}

/// Offline estimator: haversine distance stretched by a detour factor,
/// driven at a constant speed. Traffic is the free-flow duration scaled by
/// the congestion factor of the requested bucket.
pub struct AsTheCrowFlies {
    speed_kmh: f64,
    detour_factor: f64,
    congestion: CongestionFactors,
}

impl AsTheCrowFlies {
    pub fn new(speed_kmh: f64, detour_factor: f64) -> Self {
        Self {
            speed_kmh,
            detour_factor,
            congestion: CongestionFactors::default(),
        }
    }

    pub fn with_congestion(mut self, congestion: CongestionFactors) -> Self {
        self.congestion = congestion;
        self
    }

    pub fn estimate(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        if self.speed_kmh <= 0.0 {
            return Err(TravelError::NoRoute);
        }

        let distance = query.origin.haversine_distance(&query.destination).value() * self.detour_factor;
        let duration = distance * 3.6 / self.speed_kmh;
        let factor = self.congestion.factor(query.time_of_day).max(1.0);

        Ok(TravelEstimate {
            distance_meters: distance,
            duration_seconds: duration,
            duration_in_traffic_seconds: Some(duration * factor),
        })
    }
}

impl TravelDistanceProvider for AsTheCrowFlies {
    async fn query(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        self.estimate(query)
    }
}
