use std::sync::Arc;

use compass_core::meters::Meters;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    canvas::{MapCanvas, OverlayElement, OverlayKey},
    location::{
        distance_filter::{DEFAULT_DISTANCE_FILTER_METERS, DistanceFilter},
        position::{LocationError, Position},
        position_source::{PositionEvent, PositionSource, WatchId, WatchOptions},
    },
    overlay_arena::OverlayArena,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationStreamParams {
    pub high_accuracy: bool,
    pub maximum_age: SignedDuration,
    pub timeout: SignedDuration,
    pub distance_filter_meters: f64,
}

impl Default for LocationStreamParams {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            maximum_age: SignedDuration::ZERO,
            timeout: SignedDuration::from_secs(10),
            distance_filter_meters: DEFAULT_DISTANCE_FILTER_METERS,
        }
    }
}

impl LocationStreamParams {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            maximum_age: self.maximum_age,
            timeout: self.timeout,
        }
    }
}

struct ActiveWatch {
    id: WatchId,
    receiver: mpsc::UnboundedReceiver<PositionEvent>,
}

/// Turns the raw position feed into a filtered signal.
///
/// A sample is retained only when it lies at least `distance_filter_meters`
/// away from the previously retained one; rejected samples have no effect at
/// all. While tracking, the retained position is drawn on the canvas as a
/// marker with its accuracy circle.
pub struct LocationStream<C: MapCanvas, S: PositionSource> {
    canvas: Arc<C>,
    source: Arc<S>,
    params: LocationStreamParams,
    filter: DistanceFilter,
    watch: Option<ActiveWatch>,
    position: Option<Position>,
    last_error: Option<LocationError>,
    overlays: OverlayArena,
}

impl<C: MapCanvas, S: PositionSource> LocationStream<C, S> {
    pub fn new(canvas: Arc<C>, source: Arc<S>, params: LocationStreamParams) -> Self {
        let filter = DistanceFilter::new(Meters::new(params.distance_filter_meters));
        Self {
            canvas,
            source,
            params,
            filter,
            watch: None,
            position: None,
            last_error: None,
            overlays: OverlayArena::new(),
        }
    }

    pub fn params(&self) -> &LocationStreamParams {
        &self.params
    }

    pub fn is_active(&self) -> bool {
        self.watch.is_some()
    }

    /// Latest accepted position.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    /// Starting an active stream does nothing.
    pub fn start(&mut self) -> Result<(), LocationError> {
        if self.is_active() {
            return Ok(());
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        match self.source.watch(&self.params.watch_options(), sender) {
            Ok(id) => {
                info!("LocationStream: tracking started (watch {})", id);
                self.last_error = None;
                self.watch = Some(ActiveWatch { id, receiver });
                Ok(())
            }
            Err(error) => {
                warn!("LocationStream: could not start tracking: {}", error);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Cancels the subscription and forgets the retained position. Idempotent.
    pub fn stop(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.clear_watch(watch.id);
            info!("LocationStream: tracking stopped (watch {})", watch.id);
        }
        self.position = None;
        self.overlays.clear(self.canvas.as_ref());
    }

    /// Returns whether tracking is on afterwards.
    pub fn toggle(&mut self) -> Result<bool, LocationError> {
        if self.is_active() {
            self.stop();
            Ok(false)
        } else {
            self.start().map(|_| true)
        }
    }

    /// Applies one provider callback. Returns the position if it was accepted.
    pub fn handle_event(&mut self, event: PositionEvent) -> Option<Position> {
        if !self.is_active() {
            return None;
        }

        match event {
            Ok(sample) => self.accept(sample),
            Err(error) => {
                warn!("LocationStream: provider error, tracking off: {}", error);
                self.stop();
                self.last_error = Some(error);
                None
            }
        }
    }

    /// Drains every callback delivered since the last call, returning the
    /// accepted positions in order.
    pub fn process_pending(&mut self) -> Vec<Position> {
        let mut accepted = Vec::new();
        while let Some(event) = self
            .watch
            .as_mut()
            .and_then(|watch| watch.receiver.try_recv().ok())
        {
            if let Some(position) = self.handle_event(event) {
                accepted.push(position);
            }
        }
        accepted
    }

    /// Waits for the next accepted position. `None` once tracking is off.
    pub async fn next_accepted(&mut self) -> Option<Position> {
        loop {
            let event = self.watch.as_mut()?.receiver.recv().await?;
            if let Some(position) = self.handle_event(event) {
                return Some(position);
            }
        }
    }

    /// One-shot position bounded by the configured timeout. Gives up with
    /// `None` rather than waiting on the provider indefinitely.
    pub async fn locate_once(&self) -> Option<Position> {
        let options = self.params.watch_options();
        let timeout = self.params.timeout.unsigned_abs();

        match tokio::time::timeout(timeout, self.source.current_position(&options)).await {
            Ok(Ok(position)) => Some(position),
            Ok(Err(error)) => {
                warn!("LocationStream: one-shot position failed: {}", error);
                None
            }
            Err(_) => {
                warn!("LocationStream: one-shot position timed out after {:?}", timeout);
                None
            }
        }
    }

    fn accept(&mut self, sample: Position) -> Option<Position> {
        let candidate = sample.latlng();
        if !candidate.is_valid() {
            debug!("LocationStream: dropping invalid sample {}", candidate);
            return None;
        }

        let retained = self.position.as_ref().map(|position| position.latlng());
        if !self.filter.accepts(retained.as_ref(), &candidate) {
            debug!(
                "LocationStream: sample {} within {} of retained position",
                candidate,
                self.filter.threshold()
            );
            return None;
        }

        self.position = Some(sample);
        self.render(&sample);
        Some(sample)
    }

    fn render(&mut self, position: &Position) {
        let canvas = self.canvas.as_ref();
        self.overlays.upsert(
            canvas,
            OverlayElement::Marker {
                key: OverlayKey::LocationMarker,
                position: position.latlng(),
                draggable: false,
            },
        );
        self.overlays.upsert(
            canvas,
            OverlayElement::Circle {
                key: OverlayKey::AccuracyRadius,
                center: position.latlng(),
                radius: Meters::new(position.accuracy),
            },
        );
    }
}

impl<C: MapCanvas, S: PositionSource> Drop for LocationStream<C, S> {
    fn drop(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.clear_watch(watch.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use compass_core::latlng::LatLng;

    use crate::{
        headless_canvas::HeadlessCanvas, location::position_source::ManualPositionSource,
        test_utils,
    };

    use super::*;

    fn stream() -> (
        Arc<HeadlessCanvas>,
        Arc<ManualPositionSource>,
        LocationStream<HeadlessCanvas, ManualPositionSource>,
    ) {
        let canvas = Arc::new(test_utils::canvas_at(LatLng::new(0.0, 0.0)));
        let source = Arc::new(ManualPositionSource::new());
        let stream = LocationStream::new(
            Arc::clone(&canvas),
            Arc::clone(&source),
            LocationStreamParams::default(),
        );
        (canvas, source, stream)
    }

    #[test]
    fn test_distance_filter_suppresses_small_moves() {
        let (_, source, mut stream) = stream();
        stream.start().unwrap();

        source.push(test_utils::position(0.0, 0.0, 5.0));
        source.push(test_utils::position(0.0, 0.00005, 5.0));
        source.push(test_utils::position(0.0, 0.0002, 5.0));

        let accepted = stream.process_pending();
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].latlng(), LatLng::new(0.0, 0.0));
        assert_eq!(accepted[1].latlng(), LatLng::new(0.0, 0.0002));
        assert_eq!(stream.position().unwrap().latlng(), LatLng::new(0.0, 0.0002));
    }

    #[test]
    fn test_rejected_sample_keeps_previous_position() {
        let (canvas, source, mut stream) = stream();
        stream.start().unwrap();

        source.push(test_utils::position(0.0, 0.0, 5.0));
        stream.process_pending();
        let marker = canvas.element(OverlayKey::LocationMarker);

        source.push(test_utils::position(0.0, 0.00005, 30.0));
        assert!(stream.process_pending().is_empty());
        assert_eq!(stream.position().unwrap().latlng(), LatLng::new(0.0, 0.0));
        assert_eq!(stream.position().unwrap().accuracy, 5.0);
        assert_eq!(canvas.element(OverlayKey::LocationMarker), marker);
    }

    #[test]
    fn test_stop_clears_position_and_visuals() {
        let (canvas, source, mut stream) = stream();
        stream.start().unwrap();
        source.push(test_utils::position(0.0, 0.0, 5.0));
        stream.process_pending();
        assert_eq!(canvas.element_count(), 2);

        stream.stop();
        stream.stop();

        assert!(!stream.is_active());
        assert!(stream.position().is_none());
        assert!(stream.last_error().is_none());
        assert_eq!(canvas.element_count(), 0);
        assert_eq!(source.active_watches(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (_, source, mut stream) = stream();
        stream.start().unwrap();
        stream.start().unwrap();
        assert_eq!(source.active_watches(), 1);

        assert_eq!(stream.toggle(), Ok(false));
        assert_eq!(stream.toggle(), Ok(true));
        assert_eq!(source.active_watches(), 1);
    }

    #[test]
    fn test_provider_error_turns_tracking_off() {
        let (canvas, source, mut stream) = stream();
        stream.start().unwrap();
        source.push(test_utils::position(0.0, 0.0, 5.0));
        source.push_error(LocationError::Timeout);

        let accepted = stream.process_pending();
        assert_eq!(accepted.len(), 1);
        assert!(!stream.is_active());
        assert_eq!(stream.last_error(), Some(&LocationError::Timeout));
        assert_eq!(canvas.element_count(), 0);

        // The consumer decides to retry
        stream.start().unwrap();
        assert!(stream.last_error().is_none());
    }

    #[test]
    fn test_permission_denied_is_recorded() {
        let (_, source, mut stream) = stream();
        source.set_permission_denied(true);

        assert_eq!(stream.start(), Err(LocationError::PermissionDenied));
        assert!(!stream.is_active());
        assert_eq!(stream.last_error(), Some(&LocationError::PermissionDenied));
    }

    #[test]
    fn test_samples_after_stop_are_ignored() {
        let (_, source, mut stream) = stream();
        stream.start().unwrap();
        stream.stop();

        source.push(test_utils::position(0.0, 0.0, 5.0));
        assert!(stream.process_pending().is_empty());
        assert!(
            stream
                .handle_event(Ok(test_utils::position(0.0, 0.0, 5.0)))
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_next_accepted_skips_filtered_samples() {
        let (_, source, mut stream) = stream();
        stream.start().unwrap();

        source.push(test_utils::position(0.0, 0.0, 5.0));
        source.push(test_utils::position(0.0, 0.00001, 5.0));
        source.push(test_utils::position(0.0, 0.001, 5.0));

        let first = stream.next_accepted().await.unwrap();
        let second = stream.next_accepted().await.unwrap();
        assert_eq!(first.latlng(), LatLng::new(0.0, 0.0));
        assert_eq!(second.latlng(), LatLng::new(0.0, 0.001));
    }

    #[tokio::test]
    async fn test_locate_once_gives_up_after_timeout() {
        let canvas = Arc::new(test_utils::canvas_at(LatLng::new(0.0, 0.0)));
        let source = Arc::new(ManualPositionSource::new());
        let stream = LocationStream::new(
            canvas,
            Arc::clone(&source),
            LocationStreamParams {
                timeout: SignedDuration::from_millis(20),
                ..LocationStreamParams::default()
            },
        );

        assert_eq!(stream.locate_once().await, None);

        source.push(test_utils::position(1.0, 1.0, 5.0));
        assert_eq!(
            stream.locate_once().await.map(|position| position.latlng()),
            Some(LatLng::new(1.0, 1.0))
        );
    }
}
