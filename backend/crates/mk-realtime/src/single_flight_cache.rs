use crate::{EntityFetcher, Metrics};

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use log::{debug, error, warn};
use mk_core::{UserId, UserProfile};
use parking_lot::Mutex;

/// Profile lookups keyed by user id
pub type ProfileCache = SingleFlightCache<UserId, UserProfile>;

type SharedLookup<V> = Shared<BoxFuture<'static, Option<V>>>;

/// Observable state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never requested
    Absent,
    /// A fetch is in flight
    Pending,
    /// Terminal value known (possibly "not found")
    Resolved,
}

/// Append-only async memoization with request coalescing.
///
/// Each key is fetched at most once for the life of the cache. Concurrent
/// lookups of a pending key share the in-flight fetch. A failed fetch is
/// remembered as `None`, the same as a confirmed miss.
///
/// Lookups must be made from within a Tokio runtime: the fetch runs on its
/// own task so it finishes even if every caller stops waiting.
pub struct SingleFlightCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

struct CacheInner<K, V> {
    fetcher: Arc<dyn EntityFetcher<K, V>>,
    state: Mutex<CacheState<K, V>>,
    metrics: Metrics,
}

struct CacheState<K, V> {
    slots: HashMap<K, Slot<V>>,
    // Arena of in-flight fetches; `Slot::Pending` holds an index into it
    in_flight: Vec<Option<SharedLookup<V>>>,
    free: Vec<usize>,
}

enum Slot<V> {
    Pending(usize),
    Resolved(Option<V>),
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(fetcher: Arc<dyn EntityFetcher<K, V>>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                state: Mutex::new(CacheState {
                    slots: HashMap::new(),
                    in_flight: Vec::new(),
                    free: Vec::new(),
                }),
                metrics: Metrics::new(),
            }),
        }
    }

    /// Look up `key`.
    ///
    /// Resolved keys complete immediately, pending keys join the running
    /// fetch, and unseen keys start one. Never blocks the caller.
    pub fn get(&self, key: K) -> BoxFuture<'static, Option<V>> {
        let mut state = self.inner.state.lock();

        match state.slots.get(&key) {
            Some(Slot::Resolved(value)) => {
                self.inner.metrics.cache_lookup("hit");
                return future::ready(value.clone()).boxed();
            }
            Some(Slot::Pending(index)) => {
                if let Some(lookup) = state.in_flight.get(*index).and_then(Option::as_ref) {
                    self.inner.metrics.cache_lookup("joined");
                    debug!("Joining in-flight fetch for {key:?}");
                    return lookup.clone().boxed();
                }
                error!("Pending entry for {key:?} has no in-flight fetch, refetching");
            }
            None => {}
        }

        self.inner.metrics.cache_lookup("miss");
        let index = state.claim_slot();
        let task = tokio::spawn(run_fetch(Arc::clone(&self.inner), key.clone(), index));
        let lookup: SharedLookup<V> = task
            .map(|joined| match joined {
                Ok(value) => value,
                Err(e) => {
                    error!("Fetch task did not complete: {e}");
                    None
                }
            })
            .boxed()
            .shared();

        state.in_flight[index] = Some(lookup.clone());
        state.slots.insert(key, Slot::Pending(index));

        lookup.boxed()
    }

    pub fn entry_state(&self, key: &K) -> EntryState {
        match self.inner.state.lock().slots.get(key) {
            None => EntryState::Absent,
            Some(Slot::Pending(_)) => EntryState::Pending,
            Some(Slot::Resolved(_)) => EntryState::Resolved,
        }
    }

    /// Number of keys with a terminal value, including negative ones
    pub fn resolved_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Resolved(_)))
            .count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .in_flight
            .iter()
            .filter(|lookup| lookup.is_some())
            .count()
    }
}

impl<K, V> Clone for SingleFlightCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash,
{
    fn claim_slot(&mut self) -> usize {
        match self.free.pop() {
            Some(index) => index,
            None => {
                self.in_flight.push(None);
                self.in_flight.len() - 1
            }
        }
    }

    fn settle(&mut self, key: K, index: usize, value: Option<V>) {
        if let Some(entry) = self.in_flight.get_mut(index) {
            *entry = None;
            self.free.push(index);
        }
        self.slots.insert(key, Slot::Resolved(value));
    }
}

async fn run_fetch<K, V>(inner: Arc<CacheInner<K, V>>, key: K, index: usize) -> Option<V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    let outcome = AssertUnwindSafe(inner.fetcher.fetch(&key))
        .catch_unwind()
        .await;

    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            inner.metrics.error_occurred(e.error_code());
            warn!("Fetch for {key:?} failed, remembering as not found: {e}");
            None
        }
        Err(_) => {
            inner.metrics.error_occurred("fetch_panicked");
            error!("Fetch for {key:?} panicked, remembering as not found");
            None
        }
    };

    inner.state.lock().settle(key, index, value.clone());
    value
}
