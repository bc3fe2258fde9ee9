//! Test utilities: cache store doubles.
//!
//! Available to this crate's own tests and, behind the `test-utils` feature,
//! to downstream test suites. Not part of the stable API.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::cache::store::{BatchCompute, Compute};
use crate::cache::{CacheKey, CacheOptions, CacheStore};
use crate::core::{BuildError, Result};
use crate::value::Fragment;

/// A naive in-memory store: every `(options, key)` pair computed once, then
/// served from memory forever. No expiry, no eviction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Fragment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached fragments.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn slot(key: &CacheKey, options: &CacheOptions) -> String {
        let options = serde_json::to_string(options).unwrap_or_default();
        format!("{options}|{key}")
    }
}

impl CacheStore for MemoryStore {
    fn fetch(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: &mut Compute<'_>,
    ) -> Result<Fragment> {
        let slot = Self::slot(key, options);

        // Clone out and release the borrow before compute runs: computing a
        // key may recursively fetch from this same store.
        let cached = self.entries.borrow().get(&slot).cloned();
        if let Some(fragment) = cached {
            return Ok(fragment);
        }

        let fragment = compute()?;
        self.entries.borrow_mut().insert(slot, fragment.clone());
        Ok(fragment)
    }
}

/// One recorded batched fetch.
#[derive(Clone, Debug)]
pub struct BatchCall {
    pub keys: Vec<CacheKey>,
    pub options: CacheOptions,
}

/// Wraps any store and records every batched fetch it serves, so tests can
/// assert on round-trip counts and batch composition.
#[derive(Debug, Default)]
pub struct RecordingStore<S> {
    inner: S,
    batches: RefCell<Vec<BatchCall>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, batches: RefCell::new(Vec::new()) }
    }

    /// All batched fetches observed so far, in call order.
    pub fn batches(&self) -> Vec<BatchCall> {
        self.batches.borrow().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.borrow().len()
    }
}

impl<S: CacheStore> CacheStore for RecordingStore<S> {
    fn fetch(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: &mut Compute<'_>,
    ) -> Result<Fragment> {
        self.inner.fetch(key, options, compute)
    }

    fn fetch_batch(
        &self,
        keys: &[CacheKey],
        options: &CacheOptions,
        compute: &mut BatchCompute<'_>,
    ) -> Result<Vec<(CacheKey, Fragment)>> {
        self.batches
            .borrow_mut()
            .push(BatchCall { keys: keys.to_vec(), options: options.clone() });
        self.inner.fetch_batch(keys, options, compute)
    }
}

/// A store whose every operation fails, for failure-propagation tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingStore;

impl CacheStore for FailingStore {
    fn fetch(
        &self,
        _key: &CacheKey,
        _options: &CacheOptions,
        _compute: &mut Compute<'_>,
    ) -> Result<Fragment> {
        Err(BuildError::store("fetch", anyhow::anyhow!("store unavailable")))
    }

    fn fetch_batch(
        &self,
        _keys: &[CacheKey],
        _options: &CacheOptions,
        _compute: &mut BatchCompute<'_>,
    ) -> Result<Vec<(CacheKey, Fragment)>> {
        Err(BuildError::store("fetch_batch", anyhow::anyhow!("store unavailable")))
    }
}
