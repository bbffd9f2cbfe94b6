//! An in-memory, keyed snapshot of the last-known server state.
//!
//! Each [QueryCache] holds the client's transient belief about one remote
//! collection, tagged with an opaque [CacheKey]. The cache is written three
//! ways: a refetch replaces the whole value with server truth, an optimistic
//! mutation edits it in place before the network call resolves, and a
//! rollback restores a snapshot taken before the mutation.
//!
//! Refetches are guarded by an epoch counter: starting a mutation bumps the
//! epoch, and a refetch that began under an older epoch is discarded when it
//! completes. This stops an in-flight refetch from overwriting a newer
//! optimistic write with stale data.

use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An opaque tag used to group and invalidate related cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(&'static str);

impl CacheKey {
    /// Create a cache key from a static tag.
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The cache key for the transactions collection.
pub const TRANSACTIONS_KEY: CacheKey = CacheKey::new("transactions");
/// The cache key for the categories collection.
pub const CATEGORIES_KEY: CacheKey = CacheKey::new("categories");

/// A point-in-time copy of a cache, taken before an optimistic mutation so a
/// failed remote call can be rolled back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    value: Option<Vec<T>>,
    stale: bool,
}

#[derive(Debug)]
struct State<T> {
    /// The cached collection. `None` until the first fetch or write.
    value: Option<Vec<T>>,
    /// Whether the cached value is known to lag behind the server.
    stale: bool,
    /// Bumped whenever a mutation begins. A refetch only lands if the epoch
    /// it started under is still current.
    epoch: u64,
}

/// A keyed, in-memory snapshot of one remote collection.
///
/// Handles are passed explicitly to whatever needs them; there is no global
/// cache registry.
#[derive(Debug)]
pub struct QueryCache<T> {
    key: CacheKey,
    state: Mutex<State<T>>,
}

impl<T: Clone> QueryCache<T> {
    /// Create an empty cache tagged with `key`.
    pub fn new(key: CacheKey) -> Self {
        Self {
            key,
            state: Mutex::new(State {
                value: None,
                stale: false,
                epoch: 0,
            }),
        }
    }

    /// The key this cache is tagged with.
    pub fn key(&self) -> CacheKey {
        self.key
    }

    /// A copy of the cached collection, or `None` if nothing has been cached
    /// yet.
    pub fn get(&self) -> Option<Vec<T>> {
        self.state().value.clone()
    }

    /// Replace the cached collection with `value` and mark it fresh.
    pub fn set(&self, value: Vec<T>) {
        let mut state = self.state();
        state.value = Some(value);
        state.stale = false;
    }

    /// Edit the cached collection in place.
    ///
    /// An optimistic write against an empty cache starts from an empty
    /// collection, so the mutation is visible even before the first fetch.
    pub fn mutate(&self, apply: impl FnOnce(&mut Vec<T>)) {
        let mut state = self.state();
        apply(state.value.get_or_insert_with(Vec::new));
    }

    /// Mark the cached value as lagging behind the server.
    ///
    /// The value itself is kept so readers still have something to display
    /// until the next refetch lands.
    pub fn invalidate(&self) {
        self.state().stale = true;
        tracing::debug!("invalidated cache \"{}\"", self.key);
    }

    /// Whether the cached value is known to lag behind the server.
    pub fn is_stale(&self) -> bool {
        self.state().stale
    }

    /// Take a snapshot of the current state for a later [QueryCache::restore].
    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.state();
        Snapshot {
            value: state.value.clone(),
            stale: state.stale,
        }
    }

    /// Restore a snapshot taken by [QueryCache::snapshot], discarding any
    /// optimistic writes applied since.
    pub fn restore(&self, snapshot: Snapshot<T>) {
        let mut state = self.state();
        state.value = snapshot.value;
        state.stale = snapshot.stale;
    }

    /// Discard the results of any in-flight refetches.
    ///
    /// Called before applying an optimistic mutation so that a refetch which
    /// started earlier cannot land afterwards and clobber the mutation with
    /// stale data.
    pub fn cancel_pending(&self) {
        self.state().epoch += 1;
    }

    /// Record that a refetch is starting and return the current epoch.
    ///
    /// Pass the epoch to [QueryCache::complete_refetch] once the server has
    /// answered.
    pub fn begin_refetch(&self) -> u64 {
        self.state().epoch
    }

    /// Store the result of a refetch that began under `epoch`.
    ///
    /// Returns `false` without touching the cache if a mutation has begun
    /// since the refetch started, i.e. the fetched value is already stale.
    pub fn complete_refetch(&self, epoch: u64, value: Vec<T>) -> bool {
        let mut state = self.state();

        if state.epoch != epoch {
            tracing::debug!(
                "discarding superseded refetch for cache \"{}\"",
                self.key
            );
            return false;
        }

        state.value = Some(value);
        state.stale = false;
        true
    }

    /// Lock the inner state, recovering the guard if a previous holder
    /// panicked. The state is a plain value, so it cannot be left logically
    /// half-updated by a panic in this module.
    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
