pub mod distance_filter;
pub mod location_stream;
pub mod position;
pub mod position_source;
