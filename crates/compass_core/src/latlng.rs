use std::{fmt, str::FromStr};

use geo::{Distance, Haversine, InterpolatePoint};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::meters::Meters;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance on a spherical earth.
    pub fn haversine_distance(&self, other: &LatLng) -> Meters {
        Meters::new(Haversine.distance(geo::Point::from(*self), geo::Point::from(*other)))
    }

    /// Halfway point along the great circle, so a pair straddling the
    /// antimeridian stays on the short arc.
    pub fn midpoint(&self, other: &LatLng) -> LatLng {
        if self == other {
            return *self;
        }
        let midpoint = Haversine.point_at_ratio_between(
            geo::Point::from(*self),
            geo::Point::from(*other),
            0.5,
        );
        LatLng::new(midpoint.y(), midpoint.x())
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<LatLng> for geo::Point<f64> {
    fn from(value: LatLng) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl From<&LatLng> for geo_types::Point<f64> {
    fn from(value: &LatLng) -> Self {
        geo_types::Point::new(value.lng, value.lat)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseLatLngError {
    MissingComma,
    InvalidNumber(String),
    OutOfRange,
}

impl fmt::Display for ParseLatLngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseLatLngError::MissingComma => write!(f, "expected <lat>,<lng>"),
            ParseLatLngError::InvalidNumber(value) => write!(f, "invalid coordinate `{value}`"),
            ParseLatLngError::OutOfRange => write!(f, "coordinate out of range"),
        }
    }
}

impl std::error::Error for ParseLatLngError {}

impl FromStr for LatLng {
    type Err = ParseLatLngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or(ParseLatLngError::MissingComma)?;
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseLatLngError::InvalidNumber(value.trim().to_string()))
        };

        let latlng = LatLng::new(parse(lat)?, parse(lng)?);
        if !latlng.is_valid() {
            return Err(ParseLatLngError::OutOfRange);
        }

        Ok(latlng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance_along_equator() {
        let from = LatLng::new(0.0, 0.0);
        let to = LatLng::new(0.0, 0.0002);

        let distance = from.haversine_distance(&to).value();
        assert!((distance - 22.24).abs() < 0.1, "got {distance}");
    }

    #[test]
    fn test_haversine_distance_is_symmetric() {
        let a = LatLng::new(10.0, 10.0);
        let b = LatLng::new(10.0, 10.01);

        assert_eq!(a.haversine_distance(&b), b.haversine_distance(&a));
        assert!((a.haversine_distance(&b).value() - 1095.0).abs() < 5.0);
    }

    #[test]
    fn test_parse() {
        let latlng: LatLng = "50.85, 4.35".parse().unwrap();
        assert_eq!(latlng, LatLng::new(50.85, 4.35));

        assert_eq!(
            "50.85".parse::<LatLng>(),
            Err(ParseLatLngError::MissingComma)
        );
        assert_eq!("95.0,4.0".parse::<LatLng>(), Err(ParseLatLngError::OutOfRange));
        assert!(matches!(
            "abc,4.0".parse::<LatLng>(),
            Err(ParseLatLngError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_midpoint() {
        let a = LatLng::new(10.0, 10.0);
        let b = LatLng::new(12.0, 11.0);
        let midpoint = a.midpoint(&b);

        assert!((midpoint.lat - 11.0).abs() < 0.01, "got {midpoint}");
        assert!((midpoint.lng - 10.5).abs() < 0.01, "got {midpoint}");
        let to_a = midpoint.haversine_distance(&a).value();
        let to_b = midpoint.haversine_distance(&b).value();
        assert!((to_a - to_b).abs() < 0.01);

        assert_eq!(a.midpoint(&a), a);
    }

    #[test]
    fn test_midpoint_across_antimeridian() {
        let west = LatLng::new(0.0, 179.995);
        let east = LatLng::new(0.0, -179.995);
        let midpoint = west.midpoint(&east);

        assert!(midpoint.lng.abs() > 179.99, "got {midpoint}");
        assert!(midpoint.lat.abs() < 1e-6, "got {midpoint}");
        assert!(midpoint.haversine_distance(&west).value() < 600.0);
    }
}
