use compass_core::latlng::LatLng;
use fxhash::FxHashMap;
use parking_lot::Mutex;

use crate::canvas::{
    CanvasEventKind, ElementId, MapCanvas, OverlayElement, OverlayKey, SubscriptionId, Viewport,
};

#[derive(Default)]
struct HeadlessState {
    viewport: Option<Viewport>,
    elements: FxHashMap<ElementId, OverlayElement>,
    subscriptions: FxHashMap<SubscriptionId, CanvasEventKind>,
    next_id: u64,
    pan_count: usize,
    zoom_count: usize,
}

impl HeadlessState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory canvas with no rendering. It keeps the element and
/// subscription tables a real map would keep, which makes it usable as a
/// host for scripted sessions and as a test double.
#[derive(Default)]
pub struct HeadlessCanvas {
    state: Mutex<HeadlessState>,
}

impl HeadlessCanvas {
    pub fn new(viewport: Option<Viewport>) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                viewport,
                ..HeadlessState::default()
            }),
        }
    }

    /// Simulates the host panning or zooming. Callers still have to deliver
    /// the matching `ViewportChanged` event.
    pub fn set_viewport(&self, viewport: Option<Viewport>) {
        self.state.lock().viewport = viewport;
    }

    pub fn elements(&self) -> Vec<OverlayElement> {
        let state = self.state.lock();
        let mut elements: Vec<(ElementId, OverlayElement)> = state
            .elements
            .iter()
            .map(|(id, element)| (*id, element.clone()))
            .collect();
        elements.sort_by_key(|(id, _)| *id);
        elements.into_iter().map(|(_, element)| element).collect()
    }

    pub fn element(&self, key: OverlayKey) -> Option<OverlayElement> {
        self.state
            .lock()
            .elements
            .values()
            .find(|element| element.key() == key)
            .cloned()
    }

    pub fn element_count(&self) -> usize {
        self.state.lock().elements.len()
    }

    pub fn subscription_count(&self, kind: CanvasEventKind) -> usize {
        self.state
            .lock()
            .subscriptions
            .values()
            .filter(|subscribed| **subscribed == kind)
            .count()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    pub fn pan_count(&self) -> usize {
        self.state.lock().pan_count
    }

    pub fn zoom_count(&self) -> usize {
        self.state.lock().zoom_count
    }

    pub fn center(&self) -> Option<LatLng> {
        self.state.lock().viewport.map(|viewport| viewport.center)
    }

    pub fn zoom(&self) -> Option<f64> {
        self.state.lock().viewport.map(|viewport| viewport.zoom)
    }
}

impl MapCanvas for HeadlessCanvas {
    fn viewport(&self) -> Option<Viewport> {
        self.state.lock().viewport
    }

    fn pan_to(&self, center: LatLng) {
        let mut state = self.state.lock();
        state.pan_count += 1;
        if let Some(viewport) = state.viewport.as_mut() {
            viewport.center = center;
        }
    }

    fn set_zoom(&self, zoom: f64) {
        let mut state = self.state.lock();
        state.zoom_count += 1;
        if let Some(viewport) = state.viewport.as_mut() {
            viewport.zoom = zoom;
        }
    }

    fn subscribe(&self, kind: CanvasEventKind) -> SubscriptionId {
        let mut state = self.state.lock();
        let id = SubscriptionId::new(state.next_id());
        state.subscriptions.insert(id, kind);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().subscriptions.remove(&id);
    }

    fn add_element(&self, element: OverlayElement) -> ElementId {
        let mut state = self.state.lock();
        let id = ElementId::new(state.next_id());
        state.elements.insert(id, element);
        id
    }

    fn update_element(&self, id: ElementId, element: OverlayElement) {
        if let Some(existing) = self.state.lock().elements.get_mut(&id) {
            *existing = element;
        }
    }

    fn remove_element(&self, id: ElementId) {
        self.state.lock().elements.remove(&id);
    }
}
