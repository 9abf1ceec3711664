use std::future::Future;

use fxhash::FxHashMap;
use jiff::SignedDuration;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{
    define_id_newtype,
    location::position::{LocationError, Position},
};

define_id_newtype!(WatchId);

pub type PositionEvent = Result<Position, LocationError>;
pub type PositionSink = mpsc::UnboundedSender<PositionEvent>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,

    /// Oldest cached sample the provider may answer with
    pub maximum_age: SignedDuration,

    pub timeout: SignedDuration,
}

/// The platform location capability.
pub trait PositionSource {
    /// Starts a push subscription delivering samples and errors into `sink`
    /// until [`PositionSource::clear_watch`] is called.
    fn watch(&self, options: &WatchOptions, sink: PositionSink) -> Result<WatchId, LocationError>;

    /// Must tolerate unknown or already cleared ids.
    fn clear_watch(&self, id: WatchId);

    /// One-shot request, may never resolve. Callers bound it with a timeout.
    fn current_position(
        &self,
        options: &WatchOptions,
    ) -> impl Future<Output = Result<Position, LocationError>> + Send;
}

#[derive(Default)]
struct ManualState {
    watches: FxHashMap<WatchId, PositionSink>,
    waiters: Vec<oneshot::Sender<PositionEvent>>,
    last: Option<Position>,
    denied: bool,
    next_id: u64,
}

/// Position source fed by the host: every pushed sample is fanned out to
/// all live watches. Used for replaying recorded tracks and in tests.
#[derive(Default)]
pub struct ManualPositionSource {
    state: Mutex<ManualState>,
}

impl ManualPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `watch` calls fail as if the user refused permission.
    pub fn set_permission_denied(&self, denied: bool) {
        self.state.lock().denied = denied;
    }

    /// Returns how many watches received the sample.
    pub fn push(&self, position: Position) -> usize {
        let mut state = self.state.lock();
        state.last = Some(position);
        for waiter in state.waiters.drain(..) {
            let _ = waiter.send(Ok(position));
        }
        Self::broadcast(&mut state, Ok(position))
    }

    pub fn push_error(&self, error: LocationError) -> usize {
        let mut state = self.state.lock();
        for waiter in state.waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
        Self::broadcast(&mut state, Err(error))
    }

    pub fn active_watches(&self) -> usize {
        self.state.lock().watches.len()
    }

    fn broadcast(state: &mut ManualState, event: PositionEvent) -> usize {
        // Watches whose receiver went away are pruned
        state
            .watches
            .retain(|_, sink| sink.send(event.clone()).is_ok());
        state.watches.len()
    }
}

impl PositionSource for ManualPositionSource {
    fn watch(&self, options: &WatchOptions, sink: PositionSink) -> Result<WatchId, LocationError> {
        let mut state = self.state.lock();
        if state.denied {
            return Err(LocationError::PermissionDenied);
        }

        state.next_id += 1;
        let id = WatchId::new(state.next_id);
        state.watches.insert(id, sink);

        debug!(
            "ManualPositionSource: watch {} started (high accuracy: {})",
            id, options.high_accuracy
        );
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        self.state.lock().watches.remove(&id);
    }

    async fn current_position(&self, _options: &WatchOptions) -> Result<Position, LocationError> {
        let receiver = {
            let mut state = self.state.lock();
            if state.denied {
                return Err(LocationError::PermissionDenied);
            }
            if let Some(last) = state.last {
                return Ok(last);
            }

            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            receiver
        };

        receiver
            .await
            .unwrap_or(Err(LocationError::PositionUnavailable))
    }
}
