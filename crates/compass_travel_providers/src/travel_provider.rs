use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
    as_the_crow_flies::CongestionFactors, error::TravelError, graphhopper_api::GraphHopperProfile,
    travel_query::TravelQuery, travel_result::TravelEstimate,
};

/// Capability answering point-to-point travel estimates.
pub trait TravelDistanceProvider: Send + Sync + 'static {
    fn query(
        &self,
        query: &TravelQuery,
    ) -> impl Future<Output = Result<TravelEstimate, TravelError>> + Send;
}

/// Which provider a [`crate::travel_client::TravelDistanceClient`] dispatches to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TravelProvider {
    /// https://docs.graphhopper.com/openapi/routing
    GraphHopperApi { profile: GraphHopperProfile },
    // OSRM { profile: String },
    AsTheCrowFlies {
        speed_kmh: f64,

        /// Multiplier applied to the straight-line distance to approximate road distance
        #[serde(default = "default_detour_factor")]
        detour_factor: f64,

        /// Per time-of-day multipliers for the traffic duration
        #[serde(default)]
        congestion: CongestionFactors,
    },
}

fn default_detour_factor() -> f64 {
    1.3
}

impl Default for TravelProvider {
    fn default() -> Self {
        TravelProvider::AsTheCrowFlies {
            speed_kmh: 40.0,
            detour_factor: default_detour_factor(),
            congestion: CongestionFactors::default(),
        }
    }
}
