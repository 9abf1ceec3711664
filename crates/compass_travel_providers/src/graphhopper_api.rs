use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::TravelError, travel_provider::TravelDistanceProvider, travel_query::TravelQuery,
    travel_result::TravelEstimate,
};

pub type GHPoint = [f64; 2];

pub const GRAPHHOPPER_API_KEY_ENV_VAR: &str = "GRAPHHOPPER_API_KEY";

#[derive(Debug, Deserialize, Serialize, JsonSchema, Copy, Clone, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GraphHopperProfile {
    Car,
    Bike,
    Foot,
    SmallTruck,
    Truck,
}

impl Display for GraphHopperProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GraphHopperProfile::Car => "car",
                GraphHopperProfile::Bike => "bike",
                GraphHopperProfile::Foot => "foot",
                GraphHopperProfile::SmallTruck => "small_truck",
                GraphHopperProfile::Truck => "truck",
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum GraphHopperError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response contained no path")]
    NoPath,

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<GraphHopperError> for TravelError {
    fn from(error: GraphHopperError) -> Self {
        match error {
            GraphHopperError::Request(error) => TravelError::Request(error.to_string()),
            // GraphHopper answers 400 when a point cannot be snapped or no connection exists
            GraphHopperError::Api { status: 400, .. } | GraphHopperError::NoPath => {
                TravelError::NoRoute
            }
            GraphHopperError::Api { status, message } => TravelError::Api { status, message },
            GraphHopperError::Deserialize(error) => TravelError::Request(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteRequestBody {
    /// Points as [lng, lat]
    pub points: Vec<GHPoint>,

    /// Routing profile (e.g., "car", "bike", "foot")
    pub profile: String,

    /// Only distance and time are needed, skip the geometry
    pub calc_points: bool,

    pub instructions: bool,
}

#[derive(Deserialize)]
struct RoutePath {
    /// Distance in meters
    distance: f64,

    /// Travel time in milliseconds
    time: f64,
}

#[derive(Deserialize)]
struct RouteResponse {
    paths: Vec<RoutePath>,
}

pub struct GraphHopperRouteClientParams {
    pub api_key: String,
    pub profile: GraphHopperProfile,
}

impl GraphHopperRouteClientParams {
    pub fn from_env(profile: GraphHopperProfile) -> Result<Self, TravelError> {
        let api_key = std::env::var(GRAPHHOPPER_API_KEY_ENV_VAR)
            .map_err(|_| TravelError::MissingApiKey(GRAPHHOPPER_API_KEY_ENV_VAR))?;

        Ok(Self { api_key, profile })
    }
}

pub const GRAPHHOPPER_ROUTE_API_URL: &str = "https://graphhopper.com/api/1/route";

pub struct GraphHopperRouteClient {
    params: GraphHopperRouteClientParams,
    client: reqwest::Client,
}

impl GraphHopperRouteClient {
    pub fn new(params: GraphHopperRouteClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    pub fn request_body(&self, query: &TravelQuery) -> RouteRequestBody {
        RouteRequestBody {
            points: vec![
                [query.origin.lng, query.origin.lat],
                [query.destination.lng, query.destination.lat],
            ],
            profile: self.params.profile.to_string(),
            calc_points: false,
            instructions: false,
        }
    }

    pub async fn fetch_route(
        &self,
        query: &TravelQuery,
    ) -> Result<TravelEstimate, GraphHopperError> {
        let body = self.request_body(query);

        debug!(
            "GraphHopperApi: Requesting route {} -> {} ({})",
            query.origin, query.destination, body.profile
        );

        let response = self
            .client
            .post(GRAPHHOPPER_ROUTE_API_URL)
            .query(&[("key", &self.params.api_key)])
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<TravelEstimate, GraphHopperError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GraphHopperError::Api { status, message });
        }

        let text = response.text().await?;
        parse_route_response(&text)
    }
}

fn parse_route_response(text: &str) -> Result<TravelEstimate, GraphHopperError> {
    let route: RouteResponse = serde_json::from_str(text)?;
    let path = route.paths.first().ok_or(GraphHopperError::NoPath)?;

    Ok(TravelEstimate {
        distance_meters: path.distance,
        duration_seconds: path.time / 1000.0,
        duration_in_traffic_seconds: None,
    })
}

impl TravelDistanceProvider for GraphHopperRouteClient {
    async fn query(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        Ok(self.fetch_route(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use compass_core::latlng::LatLng;
    use jiff::Timestamp;

    use crate::time_of_day::TimeOfDaySelection;

    use super::*;

    #[test]
    fn test_request_body_uses_lng_lat_order() {
        let client = GraphHopperRouteClient::new(GraphHopperRouteClientParams {
            api_key: "key".to_string(),
            profile: GraphHopperProfile::SmallTruck,
        });

        let body = client.request_body(&TravelQuery {
            origin: LatLng::new(50.0, 4.0),
            destination: LatLng::new(51.0, 5.0),
            time_of_day: TimeOfDaySelection::Now,
            departure_time: Timestamp::UNIX_EPOCH,
        });

        assert_eq!(body.points, vec![[4.0, 50.0], [5.0, 51.0]]);
        assert_eq!(body.profile, "small_truck");
        assert!(!body.calc_points);
    }

    #[test]
    fn test_parse_route_response() {
        let estimate =
            parse_route_response(r#"{ "paths": [{ "distance": 1300.5, "time": 120000 }] }"#)
                .unwrap();
        assert_eq!(estimate.distance_meters, 1300.5);
        assert_eq!(estimate.duration_seconds, 120.0);

        assert!(matches!(
            parse_route_response(r#"{ "paths": [] }"#),
            Err(GraphHopperError::NoPath)
        ));
    }

    #[test]
    fn test_error_mapping() {
        let error: TravelError = GraphHopperError::Api {
            status: 400,
            message: "Cannot find point 0".to_string(),
        }
        .into();
        assert_eq!(error, TravelError::NoRoute);

        let error: TravelError = GraphHopperError::Api {
            status: 429,
            message: "limit".to_string(),
        }
        .into();
        assert!(matches!(error, TravelError::Api { status: 429, .. }));
    }
}
