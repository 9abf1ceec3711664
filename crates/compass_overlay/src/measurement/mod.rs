pub mod measurement_session;
pub mod point;
pub mod segment;
pub mod subscriptions;
pub mod travel_lookups;
