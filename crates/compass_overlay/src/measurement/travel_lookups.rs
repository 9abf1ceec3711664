use std::time::Duration;

use compass_travel_providers::{
    cache::{LookupOutcome, TravelDistanceCache},
    error::TravelError,
    travel_provider::TravelDistanceProvider,
    travel_query::{TravelCacheKey, TravelQuery},
};
use fxhash::FxHashMap;
use tokio::{runtime::Handle, sync::mpsc, task::AbortHandle};
use tracing::{debug, warn};

use crate::measurement::segment::SegmentId;

#[derive(Debug)]
pub struct LookupCompletion {
    pub segment: SegmentId,
    pub key: TravelCacheKey,
    pub outcome: LookupOutcome,
    ticket: u64,
}

struct InFlight {
    ticket: u64,
    task: AbortHandle,
}

/// Reports the end of a lookup task, however it ends. A task dropped before
/// it has an outcome (aborted, or unwinding from a provider panic) completes
/// as `Cancelled`.
struct CompletionSender {
    sender: mpsc::UnboundedSender<LookupCompletion>,
    segment: SegmentId,
    key: TravelCacheKey,
    ticket: u64,
    outcome: Option<LookupOutcome>,
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(Err(TravelError::Cancelled));
        // The receiver is gone once the owner is dropped
        let _ = self.sender.send(LookupCompletion {
            segment: self.segment,
            key: self.key,
            outcome,
            ticket: self.ticket,
        });
    }
}

/// At most one outstanding travel lookup per segment.
///
/// A new request for a segment supersedes the previous one, and results of
/// superseded or cancelled requests are discarded on arrival. Each request
/// waits `debounce` before reaching the cache, so a burst of requests only
/// queries the provider for the last one.
pub struct TravelLookups {
    debounce: Duration,
    sender: mpsc::UnboundedSender<LookupCompletion>,
    receiver: mpsc::UnboundedReceiver<LookupCompletion>,
    in_flight: FxHashMap<SegmentId, InFlight>,
    next_ticket: u64,
}

impl TravelLookups {
    pub fn new(debounce: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            debounce,
            sender,
            receiver,
            in_flight: FxHashMap::default(),
            next_ticket: 0,
        }
    }

    /// Returns false when no async runtime is available to run the lookup.
    pub fn request<P>(
        &mut self,
        cache: &TravelDistanceCache<P>,
        segment: SegmentId,
        query: TravelQuery,
        key: TravelCacheKey,
    ) -> bool
    where
        P: TravelDistanceProvider,
    {
        self.cancel(segment);

        let Ok(runtime) = Handle::try_current() else {
            warn!("TravelLookups: no runtime, cannot look up segment {}", segment);
            return false;
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let debounce = self.debounce;
        let cache = cache.clone();
        let mut completion = CompletionSender {
            sender: self.sender.clone(),
            segment,
            key,
            ticket,
            outcome: None,
        };

        let task = runtime.spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            completion.outcome = Some(cache.lookup(query).await);
        });

        debug!("TravelLookups: requested segment {} ({:?})", segment, key);
        self.in_flight.insert(
            segment,
            InFlight {
                ticket,
                task: task.abort_handle(),
            },
        );
        true
    }

    pub fn cancel(&mut self, segment: SegmentId) -> bool {
        match self.in_flight.remove(&segment) {
            Some(in_flight) => {
                in_flight.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.task.abort();
        }
        // Completions already queued belong to cancelled requests
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn is_pending(&self, segment: SegmentId) -> bool {
        self.in_flight.contains_key(&segment)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Completions that arrived since the last call, in arrival order.
    pub fn drain(&mut self) -> Vec<LookupCompletion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            if self.settle(&completion) {
                completions.push(completion);
            }
        }
        completions
    }

    /// Waits for the next current completion. `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<LookupCompletion> {
        while !self.in_flight.is_empty() {
            let completion = self.receiver.recv().await?;
            if self.settle(&completion) {
                return Some(completion);
            }
        }
        None
    }

    fn settle(&mut self, completion: &LookupCompletion) -> bool {
        match self.in_flight.get(&completion.segment) {
            Some(in_flight) if in_flight.ticket == completion.ticket => {
                self.in_flight.remove(&completion.segment);
                true
            }
            _ => {
                debug!(
                    "TravelLookups: discarding superseded result for segment {}",
                    completion.segment
                );
                false
            }
        }
    }
}
