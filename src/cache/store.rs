//! The external cache store boundary.
//!
//! The registry consumes an opaque key/value backend through [`CacheStore`]:
//! single-key fetch-or-compute plus the batched multi-key form the resolver
//! is built around. Stores own all cache semantics (expiry, eviction,
//! persistence); the registry only guarantees it hands each batch one option
//! set and computes each key at most once per store lifetime.

use crate::core::Result;
use crate::value::Fragment;

use super::key::CacheKey;
use super::options::CacheOptions;

/// Compute callback for a single key, invoked on a cache miss.
pub type Compute<'a> = dyn FnMut() -> Result<Fragment> + 'a;

/// Compute callback for a batched fetch, invoked per missing key.
pub type BatchCompute<'a> = dyn FnMut(&CacheKey) -> Result<Fragment> + 'a;

/// A key/value backend with fetch-or-compute semantics.
///
/// For each requested key the store returns the cached [`Fragment`] if one
/// exists under the given options, and otherwise calls the compute callback,
/// stores the result, and returns it. Options are passed through unmodified
/// and may be used for backend routing or entry policy; this crate only
/// groups by them.
///
/// # Errors
///
/// A store failure aborts the whole fetch: implementations propagate their
/// backend error via [`BuildError::store`](crate::BuildError::store), and the
/// registry forwards it without retrying.
pub trait CacheStore {
    /// Fetches one key, computing and storing it on a miss.
    fn fetch(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: &mut Compute<'_>,
    ) -> Result<Fragment>;

    /// Fetches a batch of keys sharing one option set, in the given order.
    ///
    /// Returns one `(key, fragment)` pair per requested key, in request
    /// order. The default implementation loops [`fetch`](CacheStore::fetch);
    /// stores with a native multi-get override it.
    fn fetch_batch(
        &self,
        keys: &[CacheKey],
        options: &CacheOptions,
        compute: &mut BatchCompute<'_>,
    ) -> Result<Vec<(CacheKey, Fragment)>> {
        let mut fetched = Vec::with_capacity(keys.len());
        for key in keys {
            let fragment = self.fetch(key, options, &mut || compute(key))?;
            fetched.push((key.clone(), fragment));
        }
        Ok(fetched)
    }
}

/// The default store: no caching at all.
///
/// Every fetch calls compute, every key of every batch, in the given order.
/// This preserves the batching contract exactly while keeping cache-less
/// builds free of special cases.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl CacheStore for NullStore {
    fn fetch(
        &self,
        _key: &CacheKey,
        _options: &CacheOptions,
        compute: &mut Compute<'_>,
    ) -> Result<Fragment> {
        compute()
    }
}
