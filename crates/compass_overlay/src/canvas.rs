use compass_core::{latlng::LatLng, meters::Meters};
use serde::{Deserialize, Serialize};

use crate::{
    define_id_newtype,
    measurement::{point::PointId, segment::SegmentId},
};

define_id_newtype!(ElementId);
define_id_newtype!(SubscriptionId);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current camera of the host canvas, in web mercator zoom levels and CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn contains(&self, latlng: &LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&latlng.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&latlng.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasEventKind {
    Click,
    PointerMove,
    PointerLeave,
    MarkerClick,
    MarkerDrag,
    ViewportChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Start,
    Move,
    End,
}

/// Input delivered by the host for the kinds it was subscribed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    Click {
        at: LatLng,
    },
    PointerMove {
        at: LatLng,
    },
    PointerLeave,
    /// A click on a measurement marker, identified by the key the marker was added with
    MarkerClick {
        point: PointId,
    },
    MarkerDrag {
        point: PointId,
        phase: DragPhase,
        at: LatLng,
    },
    ViewportChanged,
}

impl CanvasEvent {
    pub fn kind(&self) -> CanvasEventKind {
        match self {
            CanvasEvent::Click { .. } => CanvasEventKind::Click,
            CanvasEvent::PointerMove { .. } => CanvasEventKind::PointerMove,
            CanvasEvent::PointerLeave => CanvasEventKind::PointerLeave,
            CanvasEvent::MarkerClick { .. } => CanvasEventKind::MarkerClick,
            CanvasEvent::MarkerDrag { .. } => CanvasEventKind::MarkerDrag,
            CanvasEvent::ViewportChanged => CanvasEventKind::ViewportChanged,
        }
    }
}

/// Identity of a visual element owned by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OverlayKey {
    LocationMarker,
    AccuracyRadius,
    MeasurementPoint(PointId),
    Segment(SegmentId),
    SegmentLabel(SegmentId),
    PreviewLine,
    PreviewLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// Anchored at the segment midpoint
    Resting,
    /// Follows a point while it is dragged
    Following,
    /// Lower-emphasis label of the preview segment
    Preview,
}

/// Geographic elements are positioned by the canvas itself, labels are
/// free-floating and placed in screen space by the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayElement {
    Marker {
        key: OverlayKey,
        position: LatLng,
        draggable: bool,
    },
    Circle {
        key: OverlayKey,
        center: LatLng,
        radius: Meters,
    },
    Polyline {
        key: OverlayKey,
        path: Vec<LatLng>,
        style: LineStyle,
    },
    Label {
        key: OverlayKey,
        screen: ScreenPoint,
        text: String,
        style: LabelStyle,
    },
}

impl OverlayElement {
    pub fn key(&self) -> OverlayKey {
        match self {
            OverlayElement::Marker { key, .. }
            | OverlayElement::Circle { key, .. }
            | OverlayElement::Polyline { key, .. }
            | OverlayElement::Label { key, .. } => *key,
        }
    }
}

/// The host map canvas. Implementations use interior mutability, every
/// overlay component receives a shared handle at construction.
pub trait MapCanvas {
    /// `None` while the canvas has not finished loading and cannot project yet.
    fn viewport(&self) -> Option<Viewport>;

    fn pan_to(&self, center: LatLng);

    fn set_zoom(&self, zoom: f64);

    fn subscribe(&self, kind: CanvasEventKind) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    fn add_element(&self, element: OverlayElement) -> ElementId;

    fn update_element(&self, id: ElementId, element: OverlayElement);

    fn remove_element(&self, id: ElementId);
}
