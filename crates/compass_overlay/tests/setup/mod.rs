use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use compass_core::latlng::LatLng;
use compass_overlay::{
    canvas::Viewport, config::OverlayConfig, headless_canvas::HeadlessCanvas,
    location::{position::Position, position_source::ManualPositionSource},
    map_overlay::MapOverlay,
};
use compass_travel_providers::{
    error::TravelError, time_of_day::TimeOfDaySelection, travel_provider::TravelDistanceProvider,
    travel_query::TravelQuery, travel_result::TravelEstimate,
};
use jiff::{SignedDuration, Timestamp};

pub type TestOverlay = MapOverlay<HeadlessCanvas, ManualPositionSource, CountingProvider>;

/// 1300 m for every pair, two minutes now and three in the morning rush.
#[derive(Default)]
pub struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TravelDistanceProvider for CountingProvider {
    async fn query(&self, query: &TravelQuery) -> Result<TravelEstimate, TravelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let duration_seconds = match query.time_of_day {
            TimeOfDaySelection::Morning => 180.0,
            TimeOfDaySelection::Evening => 240.0,
            TimeOfDaySelection::Now | TimeOfDaySelection::Weekend => 120.0,
        };

        Ok(TravelEstimate {
            distance_meters: 1300.0,
            duration_seconds,
            duration_in_traffic_seconds: None,
        })
    }
}

pub struct Harness {
    pub canvas: Arc<HeadlessCanvas>,
    pub source: Arc<ManualPositionSource>,
    pub provider: Arc<CountingProvider>,
    pub overlay: TestOverlay,
}

pub fn create_config(debounce: SignedDuration) -> OverlayConfig {
    let mut config = OverlayConfig::default();
    config.measurement.lookup_debounce = debounce;
    config.measurement.time_zone = Some(String::from("UTC"));
    config
}

pub fn create_harness(config: OverlayConfig) -> Harness {
    let canvas = Arc::new(HeadlessCanvas::new(Some(Viewport {
        center: LatLng::new(10.0, 10.0),
        zoom: 16.0,
        width: 1024.0,
        height: 768.0,
    })));
    let source = Arc::new(ManualPositionSource::new());
    let provider = Arc::new(CountingProvider::default());

    let overlay = MapOverlay::new(
        Arc::clone(&canvas),
        Arc::clone(&source),
        Arc::clone(&provider),
        config,
    );

    Harness {
        canvas,
        source,
        provider,
        overlay,
    }
}

pub fn sample(lat: f64, lng: f64, accuracy: f64) -> Position {
    Position::new(LatLng::new(lat, lng), accuracy, Timestamp::UNIX_EPOCH)
}
