use std::sync::Arc;

use compass_core::latlng::LatLng;
use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    canvas::{LabelStyle, MapCanvas, OverlayElement, OverlayKey, ScreenPoint},
    overlay_arena::OverlayArena,
    projector::ViewportProjector,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub anchor: LatLng,
    pub text: String,
    pub style: LabelStyle,
}

/// Keeps free-floating labels glued to their geographic anchors.
///
/// Labels are re-projected on every viewport change. While the projection is
/// not available a label is withheld from the canvas and shown again on the
/// next viewport change that can project it.
pub struct OverlayLabelRenderer<C: MapCanvas> {
    canvas: Arc<C>,
    projector: ViewportProjector,
    labels: FxHashMap<OverlayKey, LabelSpec>,
    arena: OverlayArena,
}

impl<C: MapCanvas> OverlayLabelRenderer<C> {
    pub fn new(canvas: Arc<C>) -> Self {
        let projector = ViewportProjector::from_canvas(canvas.as_ref());
        Self {
            canvas,
            projector,
            labels: FxHashMap::default(),
            arena: OverlayArena::new(),
        }
    }

    pub fn projector(&self) -> &ViewportProjector {
        &self.projector
    }

    pub fn label(&self, key: &OverlayKey) -> Option<&LabelSpec> {
        self.labels.get(key)
    }

    /// Where the label currently sits on screen, `None` if withheld or unknown.
    pub fn screen_position(&self, key: &OverlayKey) -> Option<ScreenPoint> {
        if !self.arena.contains(key) {
            return None;
        }
        self.labels
            .get(key)
            .and_then(|label| self.projector.to_screen(&label.anchor))
    }

    pub fn is_rendered(&self, key: &OverlayKey) -> bool {
        self.arena.contains(key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn set(&mut self, key: OverlayKey, label: LabelSpec) {
        if self.labels.get(&key) == Some(&label) && self.arena.contains(&key) {
            return;
        }
        self.labels.insert(key, label);
        self.render(key);
    }

    pub fn remove(&mut self, key: OverlayKey) {
        self.labels.remove(&key);
        self.arena.remove(self.canvas.as_ref(), key);
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.arena.clear(self.canvas.as_ref());
    }

    pub fn on_viewport_changed(&mut self) {
        self.projector.update(self.canvas.viewport());

        let keys: Vec<OverlayKey> = self.labels.keys().copied().collect();
        for key in keys {
            self.render(key);
        }
    }

    fn render(&mut self, key: OverlayKey) {
        let Some(label) = self.labels.get(&key) else {
            return;
        };

        match self.projector.to_screen(&label.anchor) {
            Some(screen) => {
                let element = OverlayElement::Label {
                    key,
                    screen,
                    text: label.text.clone(),
                    style: label.style,
                };
                self.arena.upsert(self.canvas.as_ref(), element);
            }
            None => {
                debug!("OverlayLabelRenderer: projection not ready, withholding {:?}", key);
                self.arena.remove(self.canvas.as_ref(), key);
            }
        }
    }
}
