use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use compass_core::latlng::LatLng;
use compass_travel_providers::{
    error::TravelError, time_of_day::TimeOfDaySelection, travel_provider::TravelDistanceProvider,
    travel_query::TravelQuery, travel_result::TravelEstimate,
};
use jiff::Timestamp;

use crate::{
    canvas::Viewport, headless_canvas::HeadlessCanvas, location::position::Position,
};

pub fn canvas_at(center: LatLng) -> HeadlessCanvas {
    HeadlessCanvas::new(Some(Viewport {
        center,
        zoom: 14.0,
        width: 800.0,
        height: 600.0,
    }))
}

pub fn position(lat: f64, lng: f64, accuracy: f64) -> Position {
    Position::new(LatLng::new(lat, lng), accuracy, Timestamp::UNIX_EPOCH)
}

/// Answers 1300 m for every pair, with a duration depending on the bucket.
#[derive(Default)]
pub struct StubProvider {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl StubProvider {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(true),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn stub_duration(time_of_day: TimeOfDaySelection) -> f64 {
    match time_of_day {
        TimeOfDaySelection::Now => 120.0,
        TimeOfDaySelection::Morning => 180.0,
        TimeOfDaySelection::Evening => 240.0,
        TimeOfDaySelection::Weekend => 150.0,
    }
}

impl TravelDistanceProvider for StubProvider {
    async fn query(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(TravelError::NoRoute);
        }

        Ok(TravelEstimate {
            distance_meters: 1300.0,
            duration_seconds: stub_duration(query.time_of_day),
            duration_in_traffic_seconds: None,
        })
    }
}
