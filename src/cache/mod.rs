//! Deferred, option-grouped, recursively-draining batch cache resolution.
//!
//! This module is the heart of the crate. Builders never talk to the cache
//! store directly: they register *deferred groups* — a durable [`CacheKey`],
//! a [`CacheOptions`] set, and a zero-argument thunk — with a [`LazyCache`]
//! shared by reference across the whole builder tree. Forcing the tree
//! (`Builder::materialize`) drains every pending registration with the
//! minimum number of store round-trips:
//!
//! - registrations are grouped by option-set equality, because the store's
//!   batched operation accepts one option set per call — one batch call per
//!   distinct option set per resolution pass;
//! - within a group, keys resolve in registration order;
//! - a thunk may itself register further deferred work mid-drain. The
//!   resolver recurses immediately after obtaining that key's value, so
//!   transitively-registered groups land directly after the entry that
//!   spawned them in the flat output sequence — and the store caches the
//!   whole [`Fragment`] (value plus spliced sub-resolutions), which keeps
//!   nested content correct on later cache hits without re-running thunks.
//!
//! # Architecture
//!
//! - [`LazyCache`]: the registry — ordered `CacheOptions → group` state and
//!   the drain algorithm ([`LazyCache::resolve`]).
//! - [`CacheStore`]: the external boundary (batched fetch-or-compute);
//!   [`NullStore`] is the cache-less default.
//! - [`CacheKey`]: durable namespaced key composition.
//! - [`CacheOptions`]: opaque grouping/routing parameters.
//!
//! # Concurrency
//!
//! Strictly single-threaded. The registry lives behind `Rc` + `RefCell`;
//! every borrow is released before any thunk or store code runs, which is
//! what makes reentrant registration during a drain safe. An implementation
//! that introduced threads would need to serialize registration against the
//! snapshot-and-clear step or the drain invariant breaks.

pub mod key;
pub mod options;
pub mod store;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::{BuildError, Result};
use crate::value::{Fragment, ValueMap};

pub use key::CacheKey;
pub use options::CacheOptions;
pub use store::{CacheStore, NullStore};

/// A deferred computation producing one materialized mapping.
pub type Thunk = Box<dyn FnOnce() -> Result<ValueMap>>;

/// One option set's worth of pending registrations, in registration order.
///
/// Re-registering an existing key replaces its thunk but keeps the first
/// occurrence's position — the same override rule as the builder's entry
/// stack.
struct DeferredGroup {
    options: CacheOptions,
    entries: Vec<(CacheKey, Thunk)>,
}

impl DeferredGroup {
    fn new(options: CacheOptions) -> Self {
        Self { options, entries: Vec::new() }
    }

    fn insert(&mut self, key: CacheKey, thunk: Thunk) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = thunk,
            None => self.entries.push((key, thunk)),
        }
    }
}

/// The shared registry of deferred cache work.
///
/// One instance is shared by reference across an entire builder inheritance
/// subtree (rooted wherever the cache store was last installed), so a single
/// [`resolve`](LazyCache::resolve) drains groups registered anywhere in that
/// subtree — siblings, array items, and nested children alike end up in the
/// same batches.
///
/// # Examples
///
/// Driving the registry directly, without a builder:
///
/// ```
/// use std::rc::Rc;
/// use treebuild::{CacheKey, CacheOptions, LazyCache, NullStore};
/// use treebuild::ValueMap;
///
/// let cache = LazyCache::new(Rc::new(NullStore));
/// cache.register(CacheKey::from("x"), CacheOptions::new(), Box::new(|| {
///     let mut map = ValueMap::new();
///     map.insert("x".into(), true.into());
///     Ok(map)
/// }));
///
/// let resolved = cache.resolve()?;
/// assert_eq!(resolved.len(), 1);
/// assert_eq!(resolved[0]["x"], true);
/// # Ok::<(), treebuild::BuildError>(())
/// ```
pub struct LazyCache {
    store: Rc<dyn CacheStore>,
    groups: RefCell<Vec<DeferredGroup>>,
}

impl LazyCache {
    /// Creates an empty registry draining through `store`.
    pub fn new(store: Rc<dyn CacheStore>) -> Self {
        Self { store, groups: RefCell::new(Vec::new()) }
    }

    /// Registers a deferred computation under `(key, options)`.
    ///
    /// Groups form in first-registration order of their option set; within a
    /// group, keys keep registration order. Valid at any time, including
    /// from inside a thunk currently executing during [`resolve`]
    /// (registrations made mid-drain are picked up before `resolve`
    /// returns).
    ///
    /// [`resolve`]: LazyCache::resolve
    pub fn register(&self, key: CacheKey, options: CacheOptions, thunk: Thunk) {
        trace!(key = %key, "registering deferred cache entry");
        let mut groups = self.groups.borrow_mut();
        match groups.iter_mut().find(|group| group.options == options) {
            Some(group) => group.insert(key, thunk),
            None => {
                let mut group = DeferredGroup::new(options);
                group.insert(key, thunk);
                groups.push(group);
            }
        }
    }

    /// Whether no registrations are pending.
    pub fn is_empty(&self) -> bool {
        self.groups.borrow().is_empty()
    }

    /// Number of pending option groups.
    pub fn pending_groups(&self) -> usize {
        self.groups.borrow().len()
    }

    /// Drains every pending registration into a flat ordered sequence of
    /// materialized mappings.
    ///
    /// Pending groups are snapshotted and the live state cleared up front,
    /// making room for the registrations the drained work is about to
    /// produce. Each group costs exactly one batched store call; each key's
    /// compute runs its thunk and then recursively resolves whatever that
    /// thunk registered, so sub-resolutions splice in directly after their
    /// triggering entry. The store caches the combined [`Fragment`], keeping
    /// the splice stable across cache hits.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure, thunk failure, or store protocol
    /// violation ([`BuildError::UnknownCacheKey`]) immediately. Groups not
    /// yet processed are dropped; no partial output is returned.
    pub fn resolve(&self) -> Result<Vec<ValueMap>> {
        let mut resolved = Vec::new();

        // Fail-fast when nothing is pending: materializing a builder that
        // never deferred anything must not touch the store.
        if self.is_empty() {
            return Ok(resolved);
        }

        let pending = self.groups.take();
        debug!(groups = pending.len(), "draining deferred cache groups");

        for group in pending {
            let DeferredGroup { options, entries } = group;
            let keys: Vec<CacheKey> = entries.iter().map(|(key, _)| key.clone()).collect();
            let mut thunks: Vec<(CacheKey, Option<Thunk>)> =
                entries.into_iter().map(|(key, thunk)| (key, Some(thunk))).collect();

            trace!(keys = keys.len(), "batched fetch for option group");
            let fetched = self.store.fetch_batch(&keys, &options, &mut |key| {
                let thunk = thunks
                    .iter_mut()
                    .filter(|(registered, _)| registered == key)
                    .find_map(|(_, slot)| slot.take())
                    .ok_or_else(|| BuildError::UnknownCacheKey { key: key.to_string() })?;

                let mut fragment = vec![thunk()?];
                fragment.extend(self.resolve()?);
                Ok(fragment)
            })?;

            for (key, fragment) in fetched {
                trace!(key = %key, mappings = fragment.len(), "resolved batch entry");
                resolved.extend(fragment);
            }
        }

        Ok(resolved)
    }
}
