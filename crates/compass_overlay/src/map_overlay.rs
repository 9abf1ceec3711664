use std::sync::Arc;

use compass_core::meters::Meters;
use compass_travel_providers::{
    cache::TravelDistanceCache, time_of_day::TimeOfDaySelection,
    travel_provider::TravelDistanceProvider,
};
use serde::Serialize;

use crate::{
    camera::CameraController,
    canvas::{CanvasEvent, MapCanvas, Viewport},
    config::OverlayConfig,
    location::{
        location_stream::LocationStream,
        position::{LocationError, Position},
        position_source::PositionSource,
    },
    measurement::{
        measurement_session::{MeasurementSession, PreviewSegment, SessionPhase},
        point::{MeasurementPoint, PointId},
        segment::{SegmentId, TravelState},
    },
};

/// Serializable snapshot of everything the overlay shows.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayState {
    pub tracking: bool,
    pub auto_follow: bool,
    pub position: Option<Position>,
    pub location_error: Option<LocationError>,
    pub measuring: bool,
    pub phase: SessionPhase,
    pub time_of_day: TimeOfDaySelection,
    pub points: Vec<MeasurementPoint>,
    pub segments: Vec<SegmentView>,
    pub preview: Option<PreviewSegment>,
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentView {
    pub id: SegmentId,
    pub from_point_id: PointId,
    pub to_point_id: PointId,
    pub straight_distance: Meters,
    pub travel: TravelState,
    pub label: String,
}

/// The overlay as the host sees it: one location stream, one camera and one
/// measurement session sharing a canvas.
pub struct MapOverlay<C: MapCanvas, S: PositionSource, P: TravelDistanceProvider> {
    canvas: Arc<C>,
    location: LocationStream<C, S>,
    camera: CameraController<C>,
    measurement: MeasurementSession<C, P>,
}

impl<C, S, P> MapOverlay<C, S, P>
where
    C: MapCanvas,
    S: PositionSource,
    P: TravelDistanceProvider,
{
    pub fn new(canvas: Arc<C>, source: Arc<S>, provider: Arc<P>, config: OverlayConfig) -> Self {
        let OverlayConfig {
            location,
            camera,
            measurement,
            ..
        } = config;

        Self {
            location: LocationStream::new(Arc::clone(&canvas), source, location),
            camera: CameraController::new(Arc::clone(&canvas), camera),
            measurement: MeasurementSession::new(
                Arc::clone(&canvas),
                TravelDistanceCache::new(provider),
                measurement,
            ),
            canvas,
        }
    }

    pub fn canvas(&self) -> &Arc<C> {
        &self.canvas
    }

    pub fn location(&self) -> &LocationStream<C, S> {
        &self.location
    }

    pub fn camera(&self) -> &CameraController<C> {
        &self.camera
    }

    pub fn measurement(&self) -> &MeasurementSession<C, P> {
        &self.measurement
    }

    pub fn start_tracking(&mut self) -> Result<(), LocationError> {
        self.location.start()
    }

    pub fn stop_tracking(&mut self) {
        self.location.stop();
    }

    pub fn toggle_tracking(&mut self) -> Result<bool, LocationError> {
        self.location.toggle()
    }

    pub fn set_auto_follow(&mut self, enabled: bool) {
        self.camera.set_auto_follow(
            enabled,
            self.location.position(),
            self.location.is_active(),
        );
    }

    pub fn toggle_auto_follow(&mut self) -> bool {
        self.camera
            .toggle_auto_follow(self.location.position(), self.location.is_active())
    }

    pub fn activate_measurement(&mut self) {
        self.measurement.activate();
    }

    pub fn deactivate_measurement(&mut self) {
        self.measurement.deactivate();
    }

    pub fn toggle_measurement(&mut self) -> bool {
        if self.measurement.is_active() {
            self.measurement.deactivate();
        } else {
            self.measurement.activate();
        }
        self.measurement.is_active()
    }

    pub fn select_time_of_day(&mut self, time_of_day: TimeOfDaySelection) {
        self.measurement.set_time_of_day(time_of_day);
    }

    pub fn handle_canvas_event(&mut self, event: &CanvasEvent) {
        self.measurement.handle_event(event);
    }

    /// Applies queued location callbacks and moves the camera for each
    /// accepted position.
    pub fn process_location_updates(&mut self) -> Vec<Position> {
        let accepted = self.location.process_pending();
        for position in &accepted {
            self.camera.follow(position, self.location.is_active());
        }
        accepted
    }

    pub async fn next_location_update(&mut self) -> Option<Position> {
        let position = self.location.next_accepted().await?;
        self.camera.follow(&position, self.location.is_active());
        Some(position)
    }

    pub async fn locate_once(&self) -> Option<Position> {
        self.location.locate_once().await
    }

    pub fn process_travel_updates(&mut self) -> usize {
        self.measurement.process_travel_updates()
    }

    pub async fn settle_travel(&mut self) {
        self.measurement.settle().await;
    }

    pub fn state(&self) -> OverlayState {
        let segments = self
            .measurement
            .segments()
            .iter()
            .map(|segment| SegmentView {
                id: segment.id,
                from_point_id: segment.from_point_id,
                to_point_id: segment.to_point_id,
                straight_distance: segment.straight_distance,
                travel: segment.travel_state(),
                label: segment.label_text(),
            })
            .collect();

        OverlayState {
            tracking: self.location.is_active(),
            auto_follow: self.camera.auto_follow(),
            position: self.location.position().copied(),
            location_error: self.location.last_error().cloned(),
            measuring: self.measurement.is_active(),
            phase: self.measurement.phase(),
            time_of_day: self.measurement.time_of_day(),
            points: self.measurement.points().to_vec(),
            segments,
            preview: self.measurement.preview().copied(),
            viewport: self.canvas.viewport(),
        }
    }

    /// Stops tracking and drops every overlay, lookup and subscription.
    pub fn teardown(mut self) {
        self.location.stop();
        self.measurement.deactivate();
    }
}
