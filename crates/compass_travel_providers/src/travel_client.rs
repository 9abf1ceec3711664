use crate::{
    as_the_crow_flies::AsTheCrowFlies,
    error::TravelError,
    graphhopper_api::{GraphHopperRouteClient, GraphHopperRouteClientParams},
    travel_provider::{TravelDistanceProvider, TravelProvider},
    travel_query::TravelQuery,
    travel_result::TravelEstimate,
};

/// Provider chosen at runtime from a [`TravelProvider`] configuration.
pub enum TravelDistanceClient {
    GraphHopper(GraphHopperRouteClient),
    AsTheCrowFlies(AsTheCrowFlies),
}

impl TravelDistanceClient {
    pub fn from_provider(provider: &TravelProvider) -> Result<Self, TravelError> {
        match provider {
            TravelProvider::GraphHopperApi { profile } => Ok(TravelDistanceClient::GraphHopper(
                GraphHopperRouteClient::new(GraphHopperRouteClientParams::from_env(*profile)?),
            )),
            TravelProvider::AsTheCrowFlies {
                speed_kmh,
                detour_factor,
                congestion,
            } => Ok(TravelDistanceClient::AsTheCrowFlies(
                AsTheCrowFlies::new(*speed_kmh, *detour_factor).with_congestion(*congestion),
            )),
        }
    }
}

impl TravelDistanceProvider for TravelDistanceClient {
    async fn query(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        match self {
            TravelDistanceClient::GraphHopper(client) => client.query(query).await,
            TravelDistanceClient::AsTheCrowFlies(client) => client.query(query).await,
        }
    }
}
