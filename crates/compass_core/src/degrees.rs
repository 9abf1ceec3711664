use std::hash::Hash;

use crate::latlng::LatLng;

/// How many micro-degrees are represented by each unit of [`RoundedDegrees`].
/// Ten micro-degrees is roughly 1.1 m at the equator, below what a user can
/// place by hand on a map.
pub const COORD_PRECISION_MICROS: i32 = 10;

/// Number of internal units in one degree.
pub const COORD_SCALE_FACTOR: f64 = (1_000_000 / COORD_PRECISION_MICROS) as f64;

/// Fixed-point coordinate component, used wherever coordinates must be
/// compared or hashed exactly.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone)]
pub struct RoundedDegrees(i32);

impl RoundedDegrees {
    pub fn degrees(&self) -> f64 {
        self.0 as f64 / COORD_SCALE_FACTOR
    }

    pub fn units(&self) -> i32 {
        self.0
    }
}

impl From<RoundedDegrees> for f64 {
    fn from(value: RoundedDegrees) -> Self {
        value.degrees()
    }
}

impl TryFrom<f64> for RoundedDegrees {
    type Error = ParseDegreesError;
    fn try_from(val: f64) -> Result<RoundedDegrees, Self::Error> {
        match (val * COORD_SCALE_FACTOR).round() {
            x if x.is_nan() => Err(ParseDegreesError::NotANumber),
            x if x > (i32::MAX as f64) => Err(ParseDegreesError::TooLarge(x)),
            x if x < (i32::MIN as f64) => Err(ParseDegreesError::TooSmall(x)),
            x => Ok(Self(x as i32)),
        }
    }
}

impl std::fmt::Debug for RoundedDegrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl std::fmt::Display for RoundedDegrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseDegreesError {
    NotANumber,
    TooLarge(f64),
    TooSmall(f64),
}

impl std::fmt::Display for ParseDegreesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseDegreesError::NotANumber => write!(f, "coordinate is not a number"),
            ParseDegreesError::TooLarge(x) => write!(f, "coordinate {x} is too large"),
            ParseDegreesError::TooSmall(x) => write!(f, "coordinate {x} is too small"),
        }
    }
}

impl std::error::Error for ParseDegreesError {}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct RoundedLatLng {
    pub lat: RoundedDegrees,
    pub lng: RoundedDegrees,
}

impl TryFrom<LatLng> for RoundedLatLng {
    type Error = ParseDegreesError;

    fn try_from(value: LatLng) -> Result<Self, Self::Error> {
        Ok(RoundedLatLng {
            lat: RoundedDegrees::try_from(value.lat)?,
            lng: RoundedDegrees::try_from(value.lng)?,
        })
    }
}

impl From<RoundedLatLng> for LatLng {
    fn from(value: RoundedLatLng) -> Self {
        LatLng::new(value.lat.degrees(), value.lng.degrees())
    }
}
