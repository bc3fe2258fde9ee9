//! Root builder configuration.
//!
//! All configuration is explicit and local: a [`BuilderConfig`] is handed to
//! the root builder at construction time and flows down through child
//! spawns. There are no process-wide defaults and no ambient mutable state.

use std::fmt;
use std::rc::Rc;

use crate::cache::{CacheStore, NullStore};
use crate::value::Value;

/// Key-formatting hook: rewrites every key at materialize time.
pub type KeyFormat = dyn Fn(&str) -> String;

/// Value-suppression hook: entries whose value it accepts are dropped from
/// the output entirely.
pub type ValueFilter = dyn Fn(&Value) -> bool;

/// Configuration for a root [`Builder`](crate::Builder).
///
/// Children inherit the hooks by value at spawn time and the store by
/// reference; overrides made on a child after spawning never propagate back
/// up or sideways.
///
/// # Examples
///
/// ```
/// use treebuild::{Builder, BuilderConfig};
///
/// let config = BuilderConfig::new()
///     .format_key(|key| key.to_uppercase())
///     .suppress_value(|value| value.is_null());
/// let mut builder = Builder::with_config(config);
///
/// builder.set("name", "X");
/// builder.set("gone", treebuild::Value::Null);
///
/// let data = builder.materialize()?;
/// assert_eq!(data.keys().collect::<Vec<_>>(), ["NAME"]);
/// # Ok::<(), treebuild::BuildError>(())
/// ```
#[derive(Clone, Default)]
pub struct BuilderConfig {
    pub(crate) format_key: Option<Rc<KeyFormat>>,
    pub(crate) suppress_value: Option<Rc<ValueFilter>>,
    pub(crate) store: Option<Rc<dyn CacheStore>>,
}

impl BuilderConfig {
    /// Default configuration: identity key formatting, no suppression, and
    /// the pass-through [`NullStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the key-formatting hook.
    pub fn format_key(mut self, format: impl Fn(&str) -> String + 'static) -> Self {
        self.format_key = Some(Rc::new(format));
        self
    }

    /// Installs the value-suppression hook.
    pub fn suppress_value(mut self, suppress: impl Fn(&Value) -> bool + 'static) -> Self {
        self.suppress_value = Some(Rc::new(suppress));
        self
    }

    /// Installs the external cache store.
    pub fn store(self, store: impl CacheStore + 'static) -> Self {
        self.shared_store(Rc::new(store))
    }

    /// Installs an already-shared cache store, keeping the caller's handle
    /// to it (useful when the caller needs to inspect the store afterwards).
    pub fn shared_store(mut self, store: Rc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub(crate) fn store_or_default(&self) -> Rc<dyn CacheStore> {
        match &self.store {
            Some(store) => Rc::clone(store),
            None => Rc::new(NullStore),
        }
    }
}

impl fmt::Debug for BuilderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderConfig")
            .field("format_key", &self.format_key.as_ref().map(|_| "<hook>"))
            .field("suppress_value", &self.suppress_value.as_ref().map(|_| "<hook>"))
            .field("store", &self.store.as_ref().map(|_| "<store>"))
            .finish()
    }
}
