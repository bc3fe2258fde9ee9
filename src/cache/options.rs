//! Option sets attached to deferred cache registrations.

use serde::Serialize;

use crate::value::{Value, ValueMap};

/// An opaque bag of routing/backend parameters for a batch of cache keys.
///
/// The registry groups registrations by option-set equality and passes the
/// set through to the store unmodified, once per batch. The content is never
/// interpreted by this crate.
///
/// # Examples
///
/// ```
/// use treebuild::CacheOptions;
///
/// let options = CacheOptions::new().with("expires_in", 300).with("race_ttl", true);
/// assert!(!options.is_empty());
/// assert_eq!(options, CacheOptions::new().with("expires_in", 300).with("race_ttl", true));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheOptions(ValueMap);

impl CacheOptions {
    /// An empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `key` bound to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether the set carries no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying ordered mapping, for stores that route on it.
    pub fn as_map(&self) -> &ValueMap {
        &self.0
    }
}
