use std::sync::{Arc, Weak};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    error::TravelError,
    travel_provider::TravelDistanceProvider,
    travel_query::{TravelCacheKey, TravelQuery},
    travel_result::TravelResult,
};

pub type LookupOutcome = Result<Arc<TravelResult>, TravelError>;

/// Handle on a lookup. Cloning it or asking the cache for the same key again
/// attaches to the same underlying provider call.
pub type SharedLookup = Shared<BoxFuture<'static, LookupOutcome>>;

enum CacheEntry {
    Pending(SharedLookup),
    Ready(Arc<TravelResult>),
    Unavailable(TravelError),
}

/// Snapshot of a key's state, see [`TravelDistanceCache::peek`].
#[derive(Debug, Clone, PartialEq)]
pub enum CachedTravel {
    Pending,
    Ready(Arc<TravelResult>),
    Unavailable(TravelError),
}

#[derive(Default)]
struct CacheState {
    // Bumped on clear so requests started before the clear don't repopulate it
    generation: u64,
    entries: FxHashMap<TravelCacheKey, CacheEntry>,
}

/// Deduplicating, failure-tolerant cache in front of a travel provider.
///
/// Entries live until [`TravelDistanceCache::clear`]. A failed lookup is kept
/// as a terminal `Unavailable` marker for its key and is never retried
/// automatically.
pub struct TravelDistanceCache<P> {
    provider: Arc<P>,
    state: Arc<Mutex<CacheState>>,
}

impl<P> Clone for TravelDistanceCache<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            state: Arc::clone(&self.state),
        }
    }
}

impl<P> TravelDistanceCache<P>
where
    P: TravelDistanceProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn peek(&self, key: &TravelCacheKey) -> Option<CachedTravel> {
        self.state.lock().entries.get(key).map(|entry| match entry {
            CacheEntry::Pending(_) => CachedTravel::Pending,
            CacheEntry::Ready(result) => CachedTravel::Ready(Arc::clone(result)),
            CacheEntry::Unavailable(error) => CachedTravel::Unavailable(error.clone()),
        })
    }

    pub fn lookup(&self, query: TravelQuery) -> SharedLookup {
        let key = match query.key() {
            Ok(key) => key,
            Err(error) => return resolved(Err(error)),
        };

        let mut state = self.state.lock();
        match state.entries.get(&key) {
            Some(CacheEntry::Pending(lookup)) => {
                debug!("TravelDistanceCache: joining in-flight lookup {:?}", key);
                return lookup.clone();
            }
            Some(CacheEntry::Ready(result)) => {
                debug!("TravelDistanceCache: hit {:?}", key);
                return resolved(Ok(Arc::clone(result)));
            }
            Some(CacheEntry::Unavailable(error)) => return resolved(Err(error.clone())),
            None => {}
        }

        let generation = state.generation;
        let provider = Arc::clone(&self.provider);
        // Weak: the pending entry owns this future, a strong handle would be a cycle
        let cache_state: Weak<Mutex<CacheState>> = Arc::downgrade(&self.state);

        let lookup = async move {
            let outcome = provider
                .query(&query)
                .await
                .map(|estimate| Arc::new(TravelResult::new(estimate, query.departure_time)));

            if let Err(error) = &outcome {
                warn!(
                    "TravelDistanceCache: lookup {} -> {} unavailable: {}",
                    query.origin, query.destination, error
                );
            }

            if let Some(cache_state) = cache_state.upgrade() {
                let mut state = cache_state.lock();
                if state.generation == generation {
                    let entry = match &outcome {
                        Ok(result) => CacheEntry::Ready(Arc::clone(result)),
                        Err(error) => CacheEntry::Unavailable(error.clone()),
                    };
                    state.entries.insert(key, entry);
                }
            }

            outcome
        }
        .boxed()
        .shared();

        state
            .entries
            .insert(key, CacheEntry::Pending(lookup.clone()));

        lookup
    }

    /// Drops one key. A lookup still in flight for it is not cancelled and
    /// may store its result again.
    pub fn forget(&self, key: &TravelCacheKey) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn resolved(outcome: LookupOutcome) -> SharedLookup {
    futures::future::ready(outcome).boxed().shared()
}
