use serde::Serialize;
use thiserror::Error;

/// Failure of a single travel lookup. Cloneable so that every caller joined
/// on the same in-flight request receives the same failure.
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TravelError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("no route found")]
    NoRoute,

    #[error("missing API key in {0}")]
    MissingApiKey(&'static str),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("lookup cancelled")]
    Cancelled,
}
