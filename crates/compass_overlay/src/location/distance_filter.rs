use compass_core::{latlng::LatLng, meters::Meters};

pub const DEFAULT_DISTANCE_FILTER_METERS: f64 = 10.0;

/// Great-circle distance, shared by the location filter and the
/// measurement tool's straight-line segments.
pub fn distance(from: &LatLng, to: &LatLng) -> Meters {
    from.haversine_distance(to)
}

/// Suppresses location samples that did not move far enough from the last
/// retained one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceFilter {
    threshold: Meters,
}

impl Default for DistanceFilter {
    fn default() -> Self {
        Self::new(Meters::new(DEFAULT_DISTANCE_FILTER_METERS))
    }
}

impl DistanceFilter {
    pub fn new(threshold: Meters) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Meters {
        self.threshold
    }

    /// With nothing retained every sample passes.
    pub fn accepts(&self, retained: Option<&LatLng>, candidate: &LatLng) -> bool {
        match retained {
            None => true,
            Some(retained) => distance(retained, candidate) >= self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_always_passes() {
        let filter = DistanceFilter::default();
        assert!(filter.accepts(None, &LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn test_threshold() {
        let filter = DistanceFilter::default();
        let origin = LatLng::new(0.0, 0.0);

        // ~5.6 m
        assert!(!filter.accepts(Some(&origin), &LatLng::new(0.0, 0.00005)));
        // ~22 m
        assert!(filter.accepts(Some(&origin), &LatLng::new(0.0, 0.0002)));
        assert!(filter.accepts(Some(&origin), &LatLng::new(0.0, 0.0001)));
    }

    #[test]
    fn test_zero_threshold_accepts_identical_sample() {
        let filter = DistanceFilter::new(Meters::ZERO);
        let origin = LatLng::new(0.0, 0.0);
        assert!(filter.accepts(Some(&origin), &origin));
    }
}
