use fxhash::FxHashMap;

use crate::canvas::{ElementId, MapCanvas, OverlayElement, OverlayKey};

/// Canvas handles of the elements one component owns, keyed by what they
/// represent. Adding an element under an existing key updates it in place.
#[derive(Debug, Default)]
pub struct OverlayArena {
    handles: FxHashMap<OverlayKey, ElementId>,
}

impl OverlayArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert<C: MapCanvas + ?Sized>(&mut self, canvas: &C, element: OverlayElement) {
        let key = element.key();
        match self.handles.get(&key) {
            Some(id) => canvas.update_element(*id, element),
            None => {
                let id = canvas.add_element(element);
                self.handles.insert(key, id);
            }
        }
    }

    pub fn remove<C: MapCanvas + ?Sized>(&mut self, canvas: &C, key: OverlayKey) -> bool {
        match self.handles.remove(&key) {
            Some(id) => {
                canvas.remove_element(id);
                true
            }
            None => false,
        }
    }

    pub fn clear<C: MapCanvas + ?Sized>(&mut self, canvas: &C) {
        for (_, id) in self.handles.drain() {
            canvas.remove_element(id);
        }
    }

    pub fn contains(&self, key: &OverlayKey) -> bool {
        self.handles.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
