pub mod as_the_crow_flies;
pub mod cache;
pub mod error;
pub mod graphhopper_api;
pub mod time_of_day;
pub mod travel_client;
pub mod travel_provider;
pub mod travel_query;
pub mod travel_result;
