use compass_core::latlng::LatLng;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw sample from the location provider. Never mutated once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,

    /// Radius of the 68% confidence circle, in meters
    pub accuracy: f64,

    /// Degrees clockwise from true north
    pub heading: Option<f64>,

    /// Meters per second
    pub speed: Option<f64>,

    pub timestamp: Timestamp,
}

impl Position {
    pub fn new(latlng: LatLng, accuracy: f64, timestamp: Timestamp) -> Self {
        Self {
            lat: latlng.lat,
            lng: latlng.lng,
            accuracy,
            heading: None,
            speed: None,
            timestamp,
        }
    }

    pub fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for a position")]
    Timeout,

    #[error("location not supported: {0}")]
    Unsupported(String),
}
