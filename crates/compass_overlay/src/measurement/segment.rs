use std::sync::Arc;

use compass_core::meters::Meters;
use compass_travel_providers::{
    error::TravelError, travel_query::TravelCacheKey, travel_result::TravelResult,
};
use serde::Serialize;

use crate::{define_id_newtype, measurement::point::PointId};

define_id_newtype!(SegmentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Idle,
    Pending,
    Unavailable,
}

/// What the travel part of a segment shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "result", rename_all = "snake_case")]
pub enum TravelState {
    /// Nothing resolved yet
    NoData,
    /// A previous result is shown while a fresher one is fetched
    Stale(Arc<TravelResult>),
    Ready(Arc<TravelResult>),
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct MeasurementSegment {
    pub id: SegmentId,
    pub from_point_id: PointId,
    pub to_point_id: PointId,

    /// Always current for the endpoint positions
    pub straight_distance: Meters,

    pub travel_result: Option<Arc<TravelResult>>,

    /// Key of the most recently requested lookup
    pub cache_key: Option<TravelCacheKey>,

    /// Every key looked up for this segment, across time-of-day switches and drags
    pub requested_keys: Vec<TravelCacheKey>,

    pub lookup_status: LookupStatus,
    pub unavailable_reason: Option<TravelError>,
}

impl MeasurementSegment {
    pub fn new(
        id: SegmentId,
        from_point_id: PointId,
        to_point_id: PointId,
        straight_distance: Meters,
    ) -> Self {
        Self {
            id,
            from_point_id,
            to_point_id,
            straight_distance,
            travel_result: None,
            cache_key: None,
            requested_keys: Vec::new(),
            lookup_status: LookupStatus::Idle,
            unavailable_reason: None,
        }
    }

    pub fn touches(&self, point: PointId) -> bool {
        self.from_point_id == point || self.to_point_id == point
    }

    pub fn travel_state(&self) -> TravelState {
        match (self.lookup_status, &self.travel_result) {
            (LookupStatus::Unavailable, _) => TravelState::Unavailable,
            (LookupStatus::Pending, Some(result)) => TravelState::Stale(Arc::clone(result)),
            (LookupStatus::Idle, Some(result)) => TravelState::Ready(Arc::clone(result)),
            (_, None) => TravelState::NoData,
        }
    }

    pub fn label_text(&self) -> String {
        let straight = self.straight_distance;
        match self.travel_state() {
            TravelState::NoData => format!("{straight} (route pending)"),
            TravelState::Stale(result) => format!(
                "{straight} (drive {}, {}, updating)",
                result.distance_text,
                result.duration_text()
            ),
            TravelState::Ready(result) => format!(
                "{straight} (drive {}, {})",
                result.distance_text,
                result.duration_text()
            ),
            TravelState::Unavailable => format!("{straight} (route unavailable)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use compass_travel_providers::travel_result::TravelEstimate;
    use jiff::Timestamp;

    use super::*;

    fn segment() -> MeasurementSegment {
        MeasurementSegment::new(
            SegmentId::new(1),
            PointId::new(1),
            PointId::new(2),
            Meters::new(1120.0),
        )
    }

    fn result() -> Arc<TravelResult> {
        Arc::new(TravelResult::new(
            TravelEstimate {
                distance_meters: 1300.0,
                duration_seconds: 120.0,
                duration_in_traffic_seconds: None,
            },
            Timestamp::UNIX_EPOCH,
        ))
    }

    #[test]
    fn test_travel_states() {
        let mut segment = segment();
        assert_eq!(segment.travel_state(), TravelState::NoData);
        assert_eq!(segment.label_text(), "1.12 km (route pending)");

        segment.lookup_status = LookupStatus::Pending;
        assert_eq!(segment.travel_state(), TravelState::NoData);

        segment.travel_result = Some(result());
        assert_eq!(segment.travel_state(), TravelState::Stale(result()));
        assert_eq!(segment.label_text(), "1.12 km (drive 1.30 km, 2 min, updating)");

        segment.lookup_status = LookupStatus::Idle;
        assert_eq!(segment.travel_state(), TravelState::Ready(result()));
        assert_eq!(segment.label_text(), "1.12 km (drive 1.30 km, 2 min)");

        segment.lookup_status = LookupStatus::Unavailable;
        assert_eq!(segment.travel_state(), TravelState::Unavailable);
        assert_eq!(segment.label_text(), "1.12 km (route unavailable)");
    }

    #[test]
    fn test_touches() {
        let segment = segment();
        assert!(segment.touches(PointId::new(1)));
        assert!(segment.touches(PointId::new(2)));
        assert!(!segment.touches(PointId::new(3)));
    }
}
