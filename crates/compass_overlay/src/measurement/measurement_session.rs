use std::sync::Arc;

use compass_core::{latlng::LatLng, meters::Meters};
use compass_travel_providers::{
    cache::{CachedTravel, LookupOutcome, TravelDistanceCache},
    error::TravelError,
    time_of_day::TimeOfDaySelection,
    travel_provider::TravelDistanceProvider,
    travel_query::TravelQuery,
};
use jiff::{SignedDuration, Timestamp, Zoned};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    canvas::{
        CanvasEvent, CanvasEventKind, DragPhase, LabelStyle, LineStyle, MapCanvas, OverlayElement,
        OverlayKey,
    },
    label_renderer::{LabelSpec, OverlayLabelRenderer},
    location::distance_filter::distance,
    measurement::{
        point::{MeasurementPoint, PointId},
        segment::{LookupStatus, MeasurementSegment, SegmentId},
        subscriptions::SubscriptionTable,
        travel_lookups::{LookupCompletion, TravelLookups},
    },
    overlay_arena::OverlayArena,
    utils::newtype_id::IdSequence,
};

/// A session holds one pair of points; a click on a full session starts over.
const MAX_POINTS: usize = 2;

const SUBSCRIBED_EVENTS: [CanvasEventKind; 6] = [
    CanvasEventKind::Click,
    CanvasEventKind::PointerMove,
    CanvasEventKind::PointerLeave,
    CanvasEventKind::MarkerClick,
    CanvasEventKind::MarkerDrag,
    CanvasEventKind::ViewportChanged,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementParams {
    /// Delay before a travel lookup reaches the cache, superseded lookups are dropped
    pub lookup_debounce: SignedDuration,

    pub time_of_day: TimeOfDaySelection,

    /// IANA zone used to resolve departure times, the system zone when unset
    pub time_zone: Option<String>,
}

impl Default for MeasurementParams {
    fn default() -> Self {
        Self {
            lookup_debounce: SignedDuration::from_millis(150),
            time_of_day: TimeOfDaySelection::Now,
            time_zone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Tool not active
    Idle,
    /// Zero or one point placed
    Placing,
    /// Both points placed, segment exists
    Committed,
}

/// Hover segment between the single placed point and the pointer. Never
/// cached and never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewSegment {
    pub from_point_id: PointId,
    pub pointer: LatLng,
    pub straight_distance: Meters,
}

/// The interactive distance tool.
///
/// Owns the points and segments exclusively. Straight-line distances are
/// recomputed synchronously on every change; travel estimates are requested
/// through the [`TravelDistanceCache`] once per committed segment, per drop
/// and per time-of-day change, and arrive later through
/// [`MeasurementSession::process_travel_updates`] or
/// [`MeasurementSession::settle`].
pub struct MeasurementSession<C: MapCanvas, P: TravelDistanceProvider> {
    canvas: Arc<C>,
    cache: TravelDistanceCache<P>,
    params: MeasurementParams,
    active: bool,
    time_of_day: TimeOfDaySelection,
    points: Vec<MeasurementPoint>,
    segments: Vec<MeasurementSegment>,
    preview: Option<PreviewSegment>,
    dragging: Option<PointId>,
    ids: IdSequence,
    subscriptions: SubscriptionTable,
    lookups: TravelLookups,
    overlays: OverlayArena,
    labels: OverlayLabelRenderer<C>,
}

impl<C: MapCanvas, P: TravelDistanceProvider> MeasurementSession<C, P> {
    pub fn new(canvas: Arc<C>, cache: TravelDistanceCache<P>, params: MeasurementParams) -> Self {
        let lookups = TravelLookups::new(params.lookup_debounce.unsigned_abs());
        let labels = OverlayLabelRenderer::new(Arc::clone(&canvas));

        Self {
            time_of_day: params.time_of_day,
            canvas,
            cache,
            params,
            active: false,
            points: Vec::new(),
            segments: Vec::new(),
            preview: None,
            dragging: None,
            ids: IdSequence::default(),
            subscriptions: SubscriptionTable::default(),
            lookups,
            overlays: OverlayArena::new(),
            labels,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.active {
            SessionPhase::Idle
        } else if self.segments.is_empty() {
            SessionPhase::Placing
        } else {
            SessionPhase::Committed
        }
    }

    pub fn time_of_day(&self) -> TimeOfDaySelection {
        self.time_of_day
    }

    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub fn point(&self, id: PointId) -> Option<&MeasurementPoint> {
        self.points.iter().find(|point| point.id == id)
    }

    pub fn segments(&self) -> &[MeasurementSegment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&MeasurementSegment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    pub fn preview(&self) -> Option<&PreviewSegment> {
        self.preview.as_ref()
    }

    pub fn dragging(&self) -> Option<PointId> {
        self.dragging
    }

    pub fn has_pending_lookups(&self) -> bool {
        self.lookups.pending_count() > 0
    }

    pub fn labels(&self) -> &OverlayLabelRenderer<C> {
        &self.labels
    }

    pub fn cache(&self) -> &TravelDistanceCache<P> {
        &self.cache
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }

        self.active = true;
        self.subscriptions
            .subscribe_all(self.canvas.as_ref(), &SUBSCRIBED_EVENTS);
        self.labels.on_viewport_changed();
        info!("MeasurementSession: activated ({})", self.time_of_day);
    }

    /// Drops every point, segment, preview, pending lookup and cached result,
    /// and releases the input subscriptions.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }

        self.clear();
        self.subscriptions.unsubscribe_all(self.canvas.as_ref());
        self.active = false;
        info!("MeasurementSession: deactivated");
    }

    /// Empties the session but keeps the tool active.
    pub fn clear(&mut self) {
        self.reset();
        self.cache.clear();
    }

    pub fn handle_event(&mut self, event: &CanvasEvent) {
        if !self.active {
            return;
        }

        match *event {
            CanvasEvent::Click { at } => self.click(at),
            CanvasEvent::PointerMove { at } => self.pointer_move(at),
            CanvasEvent::PointerLeave => self.clear_preview(),
            CanvasEvent::MarkerClick { point } => {
                self.remove_point(point);
            }
            CanvasEvent::MarkerDrag { point, phase, at } => match phase {
                DragPhase::Start => self.drag_start(point),
                DragPhase::Move => self.drag_move(point, at),
                DragPhase::End => self.drag_end(point, at),
            },
            CanvasEvent::ViewportChanged => self.on_viewport_changed(),
        }
    }

    pub fn click(&mut self, at: LatLng) {
        if !self.active || !at.is_valid() {
            return;
        }

        if self.points.len() >= MAX_POINTS {
            debug!("MeasurementSession: third click, starting over at {}", at);
            self.reset();
        }

        self.commit_point(at);
    }

    pub fn pointer_move(&mut self, at: LatLng) {
        if !self.active || self.dragging.is_some() || !at.is_valid() {
            return;
        }

        let [from] = self.points.as_slice() else {
            self.clear_preview();
            return;
        };

        let preview = PreviewSegment {
            from_point_id: from.id,
            pointer: at,
            straight_distance: distance(&from.latlng(), &at),
        };

        self.overlays.upsert(
            self.canvas.as_ref(),
            OverlayElement::Polyline {
                key: OverlayKey::PreviewLine,
                path: vec![from.latlng(), at],
                style: LineStyle::Dashed,
            },
        );
        self.labels.set(
            OverlayKey::PreviewLabel,
            LabelSpec {
                anchor: at,
                text: preview.straight_distance.to_string(),
                style: LabelStyle::Preview,
            },
        );
        self.preview = Some(preview);
    }

    /// Removes the point, its incident segments and their pending lookups.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        if !self.active {
            return false;
        }
        let Some(index) = self.points.iter().position(|point| point.id == id) else {
            return false;
        };

        self.points.remove(index);
        self.overlays
            .remove(self.canvas.as_ref(), OverlayKey::MeasurementPoint(id));

        let (incident, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.segments)
            .into_iter()
            .partition(|segment| segment.touches(id));
        self.segments = kept;

        for MeasurementSegment {
            id: segment,
            requested_keys,
            ..
        } in incident
        {
            self.lookups.cancel(segment);
            for key in &requested_keys {
                self.cache.forget(key);
            }
            self.overlays
                .remove(self.canvas.as_ref(), OverlayKey::Segment(segment));
            self.labels.remove(OverlayKey::SegmentLabel(segment));
        }

        if self.dragging == Some(id) {
            self.dragging = None;
        }
        self.clear_preview();

        debug!("MeasurementSession: removed point {}", id);
        true
    }

    pub fn drag_start(&mut self, id: PointId) {
        if !self.active || self.point(id).is_none() {
            return;
        }

        self.dragging = Some(id);
        self.clear_preview();
    }

    /// Straight-line distance only, the label follows the dragged point.
    pub fn drag_move(&mut self, id: PointId, at: LatLng) {
        if !self.active || !at.is_valid() {
            return;
        }

        self.dragging = Some(id);
        if !self.move_point(id, at) {
            self.dragging = None;
        }
    }

    /// The drop: labels return to rest and a fresh travel lookup is issued.
    /// The previous travel result stays visible until the new one arrives.
    pub fn drag_end(&mut self, id: PointId, at: LatLng) {
        if !self.active {
            return;
        }

        self.dragging = None;
        if at.is_valid() {
            self.move_point(id, at);
        }

        for segment in self.incident_segments(id) {
            self.render_segment(segment);
            self.request_travel(segment);
        }
    }

    /// Re-issues the lookups of every segment for the new departure bucket.
    /// Points are untouched.
    pub fn set_time_of_day(&mut self, time_of_day: TimeOfDaySelection) {
        if self.time_of_day == time_of_day {
            return;
        }

        info!(
            "MeasurementSession: time of day {} -> {}",
            self.time_of_day, time_of_day
        );
        self.time_of_day = time_of_day;

        let segments: Vec<SegmentId> = self.segments.iter().map(|segment| segment.id).collect();
        for segment in segments {
            self.request_travel(segment);
        }
    }

    pub fn on_viewport_changed(&mut self) {
        self.labels.on_viewport_changed();
    }

    /// Applies every travel result that arrived since the last call.
    pub fn process_travel_updates(&mut self) -> usize {
        let completions = self.lookups.drain();
        let count = completions.len();
        for completion in completions {
            self.apply_completion(completion);
        }
        count
    }

    /// Waits until no lookup is pending, applying results as they arrive.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.lookups.next().await {
            self.apply_completion(completion);
        }
    }

    fn reset(&mut self) {
        self.lookups.cancel_all();
        self.points.clear();
        self.segments.clear();
        self.preview = None;
        self.dragging = None;
        self.overlays.clear(self.canvas.as_ref());
        self.labels.clear();
    }

    fn commit_point(&mut self, at: LatLng) {
        let id: PointId = self.ids.next();
        self.points.push(MeasurementPoint::new(id, at));
        self.render_point(id);
        debug!("MeasurementSession: placed point {} at {}", id, at);

        if self.points.len() == MAX_POINTS {
            self.clear_preview();
            let from = self.points[self.points.len() - 2].id;
            self.create_segment(from, id);
        }
    }

    fn create_segment(&mut self, from: PointId, to: PointId) {
        let Some(straight_distance) = self.straight_distance(from, to) else {
            return;
        };

        let id: SegmentId = self.ids.next();
        self.segments
            .push(MeasurementSegment::new(id, from, to, straight_distance));
        self.render_segment(id);
        self.request_travel(id);
    }

    fn straight_distance(&self, from: PointId, to: PointId) -> Option<Meters> {
        let from = self.point(from)?;
        let to = self.point(to)?;
        Some(distance(&from.latlng(), &to.latlng()))
    }

    fn incident_segments(&self, point: PointId) -> Vec<SegmentId> {
        self.segments
            .iter()
            .filter(|segment| segment.touches(point))
            .map(|segment| segment.id)
            .collect()
    }

    /// Moves the point and synchronously refreshes its segments' straight
    /// distances. Returns false for an unknown point.
    fn move_point(&mut self, id: PointId, at: LatLng) -> bool {
        let Some(point) = self.points.iter_mut().find(|point| point.id == id) else {
            return false;
        };
        point.move_to(at);
        self.render_point(id);

        for segment_id in self.incident_segments(id) {
            let endpoints = self
                .segment(segment_id)
                .map(|segment| (segment.from_point_id, segment.to_point_id));
            let Some((from, to)) = endpoints else {
                continue;
            };
            let Some(straight_distance) = self.straight_distance(from, to) else {
                continue;
            };

            if let Some(segment) = self.segment_mut(segment_id) {
                segment.straight_distance = straight_distance;
            }
            self.render_segment(segment_id);
        }

        true
    }

    fn segment_mut(&mut self, id: SegmentId) -> Option<&mut MeasurementSegment> {
        self.segments.iter_mut().find(|segment| segment.id == id)
    }

    fn clear_preview(&mut self) {
        self.preview = None;
        self.overlays
            .remove(self.canvas.as_ref(), OverlayKey::PreviewLine);
        self.labels.remove(OverlayKey::PreviewLabel);
    }

    fn departure_time(&self) -> Timestamp {
        let now = match &self.params.time_zone {
            Some(name) => Zoned::now().in_tz(name),
            None => Ok(Zoned::now()),
        };

        match now.and_then(|now| self.time_of_day.departure_time(&now)) {
            Ok(departure_time) => departure_time,
            Err(error) => {
                warn!(
                    "MeasurementSession: cannot resolve {} departure, using now: {}",
                    self.time_of_day, error
                );
                Timestamp::now()
            }
        }
    }

    fn travel_query(&self, id: SegmentId) -> Option<TravelQuery> {
        let segment = self.segment(id)?;
        let from = self.point(segment.from_point_id)?;
        let to = self.point(segment.to_point_id)?;

        Some(TravelQuery {
            origin: from.latlng(),
            destination: to.latlng(),
            time_of_day: self.time_of_day,
            departure_time: self.departure_time(),
        })
    }

    fn request_travel(&mut self, id: SegmentId) {
        let Some(query) = self.travel_query(id) else {
            return;
        };

        let key = match query.key() {
            Ok(key) => key,
            Err(error) => {
                self.lookups.cancel(id);
                self.apply_outcome(id, Err(error));
                return;
            }
        };

        if let Some(segment) = self.segment_mut(id) {
            segment.cache_key = Some(key);
            if !segment.requested_keys.contains(&key) {
                segment.requested_keys.push(key);
            }
        }

        match self.cache.peek(&key) {
            Some(CachedTravel::Ready(result)) => {
                self.lookups.cancel(id);
                self.apply_outcome(id, Ok(result));
            }
            Some(CachedTravel::Unavailable(error)) => {
                self.lookups.cancel(id);
                self.apply_outcome(id, Err(error));
            }
            Some(CachedTravel::Pending) | None => {
                if !self.lookups.request(&self.cache, id, query, key) {
                    self.apply_outcome(id, Err(TravelError::Cancelled));
                    return;
                }
                if let Some(segment) = self.segment_mut(id) {
                    segment.lookup_status = LookupStatus::Pending;
                }
                self.render_segment(id);
            }
        }
    }

    fn apply_completion(&mut self, completion: LookupCompletion) {
        let current = self
            .segment(completion.segment)
            .is_some_and(|segment| segment.cache_key == Some(completion.key));
        if !current {
            debug!(
                "MeasurementSession: dropping result for stale segment {}",
                completion.segment
            );
            return;
        }

        self.apply_outcome(completion.segment, completion.outcome);
    }

    fn apply_outcome(&mut self, id: SegmentId, outcome: LookupOutcome) {
        let Some(segment) = self.segment_mut(id) else {
            return;
        };

        match outcome {
            Ok(result) => {
                segment.travel_result = Some(result);
                segment.lookup_status = LookupStatus::Idle;
                segment.unavailable_reason = None;
            }
            Err(error) => {
                warn!("MeasurementSession: segment {} route unavailable: {}", id, error);
                segment.travel_result = None;
                segment.lookup_status = LookupStatus::Unavailable;
                segment.unavailable_reason = Some(error);
            }
        }

        self.render_segment(id);
    }

    fn render_point(&mut self, id: PointId) {
        let Some(point) = self.point(id).copied() else {
            return;
        };

        self.overlays.upsert(
            self.canvas.as_ref(),
            OverlayElement::Marker {
                key: OverlayKey::MeasurementPoint(id),
                position: point.latlng(),
                draggable: true,
            },
        );
    }

    fn render_segment(&mut self, id: SegmentId) {
        let Some(segment) = self.segment(id) else {
            return;
        };
        let (Some(from), Some(to)) = (
            self.point(segment.from_point_id),
            self.point(segment.to_point_id),
        ) else {
            return;
        };

        let path = vec![from.latlng(), to.latlng()];
        let label = match self.dragging.and_then(|dragged| {
            segment
                .touches(dragged)
                .then(|| self.point(dragged))
                .flatten()
        }) {
            Some(dragged) => LabelSpec {
                anchor: dragged.latlng(),
                text: segment.label_text(),
                style: LabelStyle::Following,
            },
            None => LabelSpec {
                anchor: from.latlng().midpoint(&to.latlng()),
                text: segment.label_text(),
                style: LabelStyle::Resting,
            },
        };

        self.overlays.upsert(
            self.canvas.as_ref(),
            OverlayElement::Polyline {
                key: OverlayKey::Segment(id),
                path,
                style: LineStyle::Solid,
            },
        );
        self.labels.set(OverlayKey::SegmentLabel(id), label);
    }
}

impl<C: MapCanvas, P: TravelDistanceProvider> Drop for MeasurementSession<C, P> {
    fn drop(&mut self) {
        self.reset();
        self.subscriptions.unsubscribe_all(self.canvas.as_ref());
    }
}
