use crate::canvas::{CanvasEventKind, MapCanvas, SubscriptionId};

/// Input subscriptions held by one owner, registered and released as a whole.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    ids: Vec<SubscriptionId>,
}

impl SubscriptionTable {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Does nothing while subscriptions are held, so repeated activation
    /// never registers a listener twice.
    pub fn subscribe_all<C: MapCanvas + ?Sized>(&mut self, canvas: &C, kinds: &[CanvasEventKind]) {
        if !self.ids.is_empty() {
            return;
        }
        self.ids = kinds.iter().map(|kind| canvas.subscribe(*kind)).collect();
    }

    pub fn unsubscribe_all<C: MapCanvas + ?Sized>(&mut self, canvas: &C) {
        for id in self.ids.drain(..) {
            canvas.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::headless_canvas::HeadlessCanvas;

    use super::*;

    #[test]
    fn test_subscribe_once_and_release_all() {
        let canvas = HeadlessCanvas::default();
        let mut table = SubscriptionTable::default();
        let kinds = [CanvasEventKind::Click, CanvasEventKind::PointerMove];

        table.subscribe_all(&canvas, &kinds);
        table.subscribe_all(&canvas, &kinds);
        assert_eq!(canvas.total_subscriptions(), 2);
        assert_eq!(canvas.subscription_count(CanvasEventKind::Click), 1);

        table.unsubscribe_all(&canvas);
        assert!(table.is_empty());
        assert_eq!(canvas.total_subscriptions(), 0);
    }
}
