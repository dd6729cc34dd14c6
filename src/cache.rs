/*!
Stores that hand out reusable formatters.

Every store implements `FormatterCache`. A `SharedCache` is a single
concurrent map visible to every thread. A `LocalCache` is a plain map owned
by exactly one execution context (it isn't `Sync`), so it never contends
with anything, at the cost of one formatter per key per context.
`ContextCache` picks between the two based on the cache strategy in a
`Config`, and is what a worker holds for its lifetime.

None of these stores ever remember a failed construction. If building a
formatter fails, the error goes back to the caller and the next request for
the same key tries again.
*/

use std::{cell::RefCell, collections::HashMap, sync::Arc};

use dashmap::DashMap;

use crate::{
    config::{CacheStrategy, Config},
    error::Result,
    formatter::Formatter,
    key::FormatKey,
};

/// A map from format keys to formatters.
///
/// The only guarantee about the formatter returned for a key is that it is
/// functionally equivalent to one built fresh from that key. Callers must
/// not rely on getting the same object back twice.
pub trait FormatterCache {
    /// Return the formatter for `key`, calling `build` to construct one
    /// when the store doesn't have it yet.
    ///
    /// If `build` fails, its error is returned and nothing is stored.
    fn get_or_create(
        &self,
        key: &FormatKey,
        build: &mut dyn FnMut() -> Result<Formatter>,
    ) -> Result<Arc<Formatter>>;

    /// Remove the entry for `key`, returning it if it was present.
    fn remove(&self, key: &FormatKey) -> Option<Arc<Formatter>>;

    /// Remove every entry.
    fn clear(&self);

    /// The number of entries currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the formatter for `key`, building it with `Formatter::new`
    /// on a miss.
    fn get(&self, key: &FormatKey) -> Result<Arc<Formatter>> {
        self.get_or_create(key, &mut || Formatter::new(key))
    }
}

/// A formatter store shared by every execution context.
///
/// On a miss, the caller builds a formatter without holding any lock and
/// then inserts it only if no other caller got there first. The loser of
/// such a race throws its formatter away and uses the winner's. Entries are
/// never replaced in place.
#[derive(Debug, Default)]
pub struct SharedCache {
    map: DashMap<FormatKey, Arc<Formatter>>,
    limit: Option<usize>,
}

impl SharedCache {
    /// Create an empty, unbounded store.
    pub fn new() -> SharedCache {
        SharedCache::default()
    }

    /// Create an empty store that holds at most `limit` entries.
    ///
    /// Once the store is full, formatters for new keys are still built and
    /// returned, but they aren't stored. Existing entries are never
    /// evicted.
    pub fn with_limit(limit: usize) -> SharedCache {
        SharedCache { map: DashMap::new(), limit: Some(limit) }
    }

    /// Returns the maximum number of entries, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl FormatterCache for SharedCache {
    fn get_or_create(
        &self,
        key: &FormatKey,
        build: &mut dyn FnMut() -> Result<Formatter>,
    ) -> Result<Arc<Formatter>> {
        if let Some(entry) = self.map.get(key) {
            return Ok(Arc::clone(entry.value()));
        }
        log::debug!("shared cache miss for {key}");
        let fresh = Arc::new(build()?);
        if self.limit.is_some_and(|limit| self.map.len() >= limit) {
            log::debug!(
                "shared cache is full ({} entries), not storing {key}",
                self.map.len(),
            );
            return Ok(fresh);
        }
        let entry = self
            .map
            .entry(key.clone())
            .or_insert_with(|| Arc::clone(&fresh));
        if !Arc::ptr_eq(entry.value(), &fresh) {
            log::debug!("lost insert race for {key}, discarding new one");
        }
        Ok(Arc::clone(entry.value()))
    }

    fn remove(&self, key: &FormatKey) -> Option<Arc<Formatter>> {
        self.map.remove(key).map(|(_, formatter)| formatter)
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// A formatter store confined to a single execution context.
///
/// This type is deliberately not `Sync`. Misses are a plain insert. When a
/// context retires, dropping its store releases every formatter it held.
#[derive(Debug, Default)]
pub struct LocalCache {
    map: RefCell<HashMap<FormatKey, Arc<Formatter>>>,
}

impl LocalCache {
    pub fn new() -> LocalCache {
        LocalCache::default()
    }
}

impl FormatterCache for LocalCache {
    fn get_or_create(
        &self,
        key: &FormatKey,
        build: &mut dyn FnMut() -> Result<Formatter>,
    ) -> Result<Arc<Formatter>> {
        if let Some(formatter) = self.map.borrow().get(key) {
            return Ok(Arc::clone(formatter));
        }
        log::debug!("local cache miss for {key}");
        // The borrow is released while building, since `build` may itself
        // consult this store (e.g., a message formatting a date argument).
        let fresh = Arc::new(build()?);
        self.map.borrow_mut().insert(key.clone(), Arc::clone(&fresh));
        Ok(fresh)
    }

    fn remove(&self, key: &FormatKey) -> Option<Arc<Formatter>> {
        self.map.borrow_mut().remove(key)
    }

    fn clear(&self) {
        self.map.borrow_mut().clear();
    }

    fn len(&self) -> usize {
        self.map.borrow().len()
    }
}

impl Drop for LocalCache {
    fn drop(&mut self) {
        let len = self.map.get_mut().len();
        if len > 0 {
            log::trace!("disposing of local cache with {len} formatters");
        }
    }
}

/// The formatter store used by one execution context.
///
/// With the shared strategy this is a handle to the process-wide store.
/// With the confined strategy it owns a fresh `LocalCache`, which is
/// disposed of when this value is dropped.
#[derive(Debug)]
pub enum ContextCache {
    Shared(Arc<SharedCache>),
    Local(LocalCache),
}

impl ContextCache {
    /// Create the store for a new execution context, following the
    /// configured cache strategy. `shared` is only used by the shared
    /// strategy.
    pub fn new(config: &Config, shared: &Arc<SharedCache>) -> ContextCache {
        match config.get_cache_strategy() {
            CacheStrategy::Shared => ContextCache::Shared(Arc::clone(shared)),
            CacheStrategy::Confined => ContextCache::Local(LocalCache::new()),
        }
    }

    fn inner(&self) -> &dyn FormatterCache {
        match *self {
            ContextCache::Shared(ref cache) => &**cache,
            ContextCache::Local(ref cache) => cache,
        }
    }
}

impl FormatterCache for ContextCache {
    fn get_or_create(
        &self,
        key: &FormatKey,
        build: &mut dyn FnMut() -> Result<Formatter>,
    ) -> Result<Arc<Formatter>> {
        self.inner().get_or_create(key, build)
    }

    fn remove(&self, key: &FormatKey) -> Option<Arc<Formatter>> {
        self.inner().remove(key)
    }

    fn clear(&self) {
        self.inner().clear()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}
