use compass_core::{degrees::RoundedLatLng, latlng::LatLng};
use jiff::Timestamp;

use crate::{error::TravelError, time_of_day::TimeOfDaySelection};

/// One origin/destination pair at a resolved departure time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelQuery {
    pub origin: LatLng,
    pub destination: LatLng,
    pub time_of_day: TimeOfDaySelection,
    pub departure_time: Timestamp,
}

impl TravelQuery {
    pub fn key(&self) -> Result<TravelCacheKey, TravelError> {
        let round = |latlng: LatLng| {
            RoundedLatLng::try_from(latlng)
                .map_err(|error| TravelError::InvalidCoordinate(format!("{latlng}: {error}")))
        };

        Ok(TravelCacheKey {
            origin: round(self.origin)?,
            destination: round(self.destination)?,
            time_of_day: self.time_of_day,
        })
    }
}

/// Cache identity of a travel lookup. Coordinates are compared in fixed point
/// and the departure is reduced to its bucket, so two lookups differing only
/// by float noise or by the exact "now" instant share one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TravelCacheKey {
    pub origin: RoundedLatLng,
    pub destination: RoundedLatLng,
    pub time_of_day: TimeOfDaySelection,
}

#[cfg(test)]
mod tests {
    use std::hash::{Hash, Hasher};

    use fxhash::FxHasher64;

    use super::*;

    fn query(origin: LatLng, destination: LatLng, time_of_day: TimeOfDaySelection) -> TravelQuery {
        TravelQuery {
            origin,
            destination,
            time_of_day,
            departure_time: Timestamp::UNIX_EPOCH,
        }
    }

    fn hash(key: &TravelCacheKey) -> u64 {
        let mut hasher = FxHasher64::default();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_key_ignores_float_noise() {
        let a = query(
            LatLng::new(10.0, 10.0),
            LatLng::new(10.0, 10.01),
            TimeOfDaySelection::Now,
        );
        let b = query(
            LatLng::new(10.000_000_2, 10.0),
            LatLng::new(10.0, 10.009_999_8),
            TimeOfDaySelection::Now,
        );

        assert_eq!(a.key().unwrap(), b.key().unwrap());
        assert_eq!(hash(&a.key().unwrap()), hash(&b.key().unwrap()));
    }

    #[test]
    fn test_key_depends_on_bucket_and_direction() {
        let a = LatLng::new(10.0, 10.0);
        let b = LatLng::new(10.0, 10.01);

        let now = query(a, b, TimeOfDaySelection::Now).key().unwrap();
        let morning = query(a, b, TimeOfDaySelection::Morning).key().unwrap();
        let reversed = query(b, a, TimeOfDaySelection::Now).key().unwrap();

        assert_ne!(now, morning);
        assert_ne!(now, reversed);
    }

    #[test]
    fn test_invalid_coordinate() {
        let key = query(
            LatLng::new(f64::NAN, 0.0),
            LatLng::new(0.0, 0.0),
            TimeOfDaySelection::Now,
        )
        .key();
        assert!(matches!(key, Err(TravelError::InvalidCoordinate(_))));
    }
}
