use compass_core::meters::Meters;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// What a provider answers for one origin/destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TravelEstimate {
    pub distance_meters: f64,
    pub duration_seconds: f64,

    // Only providers with live or historical traffic fill this
    pub duration_in_traffic_seconds: Option<f64>,
}

/// A resolved travel estimate. Treated as a value: a recomputation replaces
/// the whole result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelResult {
    pub distance_meters: f64,
    pub distance_text: String,
    pub duration_seconds: f64,
    pub duration_in_traffic_seconds: Option<f64>,
    pub departure_time: Timestamp,
}

impl TravelResult {
    pub fn new(estimate: TravelEstimate, departure_time: Timestamp) -> Self {
        Self {
            distance_meters: estimate.distance_meters,
            distance_text: Meters::new(estimate.distance_meters).to_string(),
            duration_seconds: estimate.duration_seconds,
            duration_in_traffic_seconds: estimate.duration_in_traffic_seconds,
            departure_time,
        }
    }

    /// Traffic-aware duration when known, free-flow duration otherwise.
    pub fn effective_duration_seconds(&self) -> f64 {
        self.duration_in_traffic_seconds
            .unwrap_or(self.duration_seconds)
    }

    pub fn duration_text(&self) -> String {
        let minutes = (self.effective_duration_seconds() / 60.0).round() as i64;
        if minutes < 60 {
            format!("{} min", minutes.max(1))
        } else {
            format!("{} h {:02} min", minutes / 60, minutes % 60)
        }
    }
}
