use std::{fs::File, io::BufReader, path::Path};

use compass_travel_providers::travel_provider::TravelProvider;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    camera::CameraParams, location::location_stream::LocationStreamParams,
    measurement::measurement_session::MeasurementParams,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything tunable about an overlay. Every section is optional in JSON
/// and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub location: LocationStreamParams,
    pub camera: CameraParams,
    pub measurement: MeasurementParams,
    pub provider: TravelProvider,
}

impl OverlayConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
