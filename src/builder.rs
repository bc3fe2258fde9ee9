//! The recursive structure builder.
//!
//! A [`Builder`] accumulates an ordered stack of key/value entries and
//! materializes them into a [`ValueMap`]. Nested objects and arrays are
//! built through child builders that inherit the parent's hooks by value and
//! its cache registry/store by reference; the registry is the one
//! deliberately shared field, because cross-subtree sharing is what lets
//! deferred registrations from siblings and array items drain in a single
//! batched store call.
//!
//! Materialization is the only point where deferred work is forced. It
//! consumes the builder, so only the owner of the subtree root can trigger
//! it — the closures driving child builders only ever see `&mut Builder`.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::{CacheKey, CacheOptions, CacheStore, LazyCache};
use crate::config::{BuilderConfig, KeyFormat, ValueFilter};
use crate::core::{BuildError, Result};
use crate::value::{Value, ValueMap, merge_into, value_kind};

/// Body callback for [`Builder::dispatch`]: receives the child builder and,
/// for array dispatches, the current item.
pub type DispatchBody<'a> = &'a mut dyn FnMut(&mut Builder, Option<&Value>) -> Result<()>;

/// An ordered key/value structure builder with deferred batch caching.
///
/// Entry order is significant and preserved: re-setting a key overwrites its
/// value but keeps the first occurrence's position. Hooks installed via
/// [`BuilderConfig`] (or [`format_key`](Builder::format_key) /
/// [`suppress_value`](Builder::suppress_value)) shape the output at
/// materialize time.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use treebuild::{Builder, Value};
///
/// let mut builder = Builder::new();
/// builder.set("title", "release notes");
/// builder.nested("meta", |meta| {
///     meta.set("draft", false);
///     Ok(())
/// })?;
/// builder.array("sections", ["intro", "changes"], |section, name| {
///     section.set("name", name);
///     Ok(())
/// })?;
///
/// let data = builder.materialize()?;
/// assert_eq!(
///     Value::Object(data),
///     json!({
///         "title": "release notes",
///         "meta": { "draft": false },
///         "sections": [{ "name": "intro" }, { "name": "changes" }],
///     })
/// );
/// # Ok::<(), treebuild::BuildError>(())
/// ```
pub struct Builder {
    stack: Vec<(String, Value)>,
    format_key: Option<Rc<KeyFormat>>,
    suppress_value: Option<Rc<ValueFilter>>,
    registry: Rc<LazyCache>,
    store: Rc<dyn CacheStore>,
}

impl Builder {
    /// A root builder with default configuration (identity formatting, no
    /// suppression, pass-through store).
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::new())
    }

    /// A root builder with explicit configuration.
    pub fn with_config(config: BuilderConfig) -> Self {
        let store = config.store_or_default();
        let registry = Rc::new(LazyCache::new(Rc::clone(&store)));
        Self {
            stack: Vec::new(),
            format_key: config.format_key,
            suppress_value: config.suppress_value,
            registry,
            store,
        }
    }

    /// Installs the key-formatting hook on this builder.
    ///
    /// Children spawned afterwards inherit it; children spawned before, and
    /// the parent, are unaffected.
    pub fn format_key(&mut self, format: impl Fn(&str) -> String + 'static) {
        self.format_key = Some(Rc::new(format));
    }

    /// Installs the value-suppression hook on this builder.
    ///
    /// Entries whose value the hook accepts are omitted from the output
    /// entirely: no key, no null placeholder.
    pub fn suppress_value(&mut self, suppress: impl Fn(&Value) -> bool + 'static) {
        self.suppress_value = Some(Rc::new(suppress));
    }

    /// Installs a cache store on this builder, re-rooting the cache subtree.
    ///
    /// This builder and every child spawned afterwards share a fresh
    /// registry draining through `store`; previously spawned children keep
    /// the old one.
    pub fn cache_store(&mut self, store: impl CacheStore + 'static) {
        self.shared_cache_store(Rc::new(store));
    }

    /// [`cache_store`](Builder::cache_store) for an already-shared store.
    pub fn shared_cache_store(&mut self, store: Rc<dyn CacheStore>) {
        self.registry = Rc::new(LazyCache::new(Rc::clone(&store)));
        self.store = store;
    }

    /// Appends an entry. Always succeeds.
    ///
    /// A later `set` for an already-seen key wins on value but keeps the
    /// first occurrence's output position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.stack.push((key.into(), value.into()));
    }

    /// Appends every pair of `mapping`, in iteration order, as if by
    /// [`set`](Builder::set) — so formatting and suppression hooks apply.
    pub fn merge(&mut self, mapping: ValueMap) {
        for (key, value) in mapping {
            self.set(key, value);
        }
    }

    /// Copies the named fields off `source` into this builder.
    ///
    /// The source's public contract is its serialized form: `source` is
    /// serialized once and each requested field is read from the resulting
    /// object.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Serialization`] if `source` does not serialize;
    /// - [`BuildError::NonObjectSource`] if it serializes to a non-object;
    /// - [`BuildError::Access`] if a requested field is absent — a hard
    ///   failure, so builder/schema mismatches surface immediately.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde::Serialize;
    /// use treebuild::{BuildError, Builder};
    ///
    /// #[derive(Serialize)]
    /// struct Person { name: &'static str, born: u16 }
    ///
    /// let person = Person { name: "John Doe", born: 1926 };
    ///
    /// let mut builder = Builder::new();
    /// builder.extract(&person, &["name", "born"])?;
    /// assert!(matches!(
    ///     builder.extract(&person, &["died"]),
    ///     Err(BuildError::Access { .. })
    /// ));
    /// # Ok::<(), BuildError>(())
    /// ```
    pub fn extract<T: Serialize>(&mut self, source: &T, fields: &[&str]) -> Result<()> {
        let serialized = serde_json::to_value(source)?;
        let Value::Object(map) = serialized else {
            return Err(BuildError::NonObjectSource { actual: value_kind(&serialized) });
        };

        for &field in fields {
            match map.get(field) {
                Some(value) => self.set(field, value.clone()),
                None => return Err(BuildError::Access { field: field.to_string() }),
            }
        }
        Ok(())
    }

    /// Builds a nested object under `key`, eagerly.
    ///
    /// `body` runs synchronously against a child builder inheriting this
    /// builder's hooks and cache references. An empty body yields `key`
    /// bound to an empty mapping.
    ///
    /// # Errors
    ///
    /// Whatever `body` returns.
    pub fn nested<F>(&mut self, key: impl Into<String>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        let mut child = self.inherit();
        body(&mut child)?;
        let value = child.finish_into(&self.registry)?;
        self.set(key, Value::Object(value));
        Ok(())
    }

    /// Builds an array of objects under `key`, one fresh child builder per
    /// item, in item order.
    ///
    /// # Errors
    ///
    /// Whatever `body` returns; the first failure aborts the whole array.
    pub fn array<I, T, F>(&mut self, key: impl Into<String>, items: I, mut body: F) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&mut Builder, T) -> Result<()>,
    {
        let mut values = Vec::new();
        for item in items {
            let mut child = self.inherit();
            body(&mut child, item)?;
            values.push(Value::Object(child.finish_into(&self.registry)?));
        }
        self.set(key, Value::Array(values));
        Ok(())
    }

    /// Defers a cached sub-build, keyed by the durable composition of
    /// `tokens` under `options`.
    ///
    /// Nothing runs now: a thunk that spawns a child builder (hooks
    /// snapshotted at this moment), runs `body`, and flattens it is
    /// registered with the shared registry. The resolved mapping reaches the
    /// final output through [`materialize`](Builder::materialize)'s merge of
    /// the registry's flattened result — never through this builder's own
    /// entry stack.
    pub fn defer_cached<I, S, F>(&mut self, tokens: I, options: CacheOptions, body: F)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnOnce(&mut Builder) -> Result<()> + 'static,
    {
        let key = CacheKey::compose(tokens);
        trace!(key = %key, "deferring cached fragment");
        let template = self.inherit();
        let parent_registry = Rc::clone(&self.registry);
        self.registry.register(
            key,
            options,
            Box::new(move || {
                let mut child = template;
                body(&mut child)?;
                child.finish_into(&parent_registry)
            }),
        );
    }

    /// Positional dispatch over the builder's verbs, for callers driven by
    /// dynamic input (templates, rule engines) rather than typed call sites.
    ///
    /// The three valid shapes:
    ///
    /// - zero arguments with a body — nested object ([`nested`]);
    /// - one collection argument with a body — object array, the body
    ///   receiving each item ([`array`]);
    /// - one argument without a body — plain [`set`].
    ///
    /// # Errors
    ///
    /// [`BuildError::Usage`] for any other shape, naming the valid shapes
    /// and what was received.
    ///
    /// [`nested`]: Builder::nested
    /// [`array`]: Builder::array
    /// [`set`]: Builder::set
    pub fn dispatch(
        &mut self,
        key: &str,
        args: &[Value],
        body: Option<DispatchBody<'_>>,
    ) -> Result<()> {
        match (args, body) {
            ([], Some(body)) => {
                let mut child = self.inherit();
                body(&mut child, None)?;
                let value = child.finish_into(&self.registry)?;
                self.set(key, Value::Object(value));
                Ok(())
            }
            ([Value::Array(items)], Some(body)) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let mut child = self.inherit();
                    body(&mut child, Some(item))?;
                    values.push(Value::Object(child.finish_into(&self.registry)?));
                }
                self.set(key, Value::Array(values));
                Ok(())
            }
            ([value], Some(_)) => Err(BuildError::Usage {
                key: key.to_string(),
                received: format!("1 {} argument with a body", value_kind(value)),
            }),
            ([value], None) => {
                self.set(key, value.clone());
                Ok(())
            }
            (rest, body) => Err(BuildError::usage(key, rest.len(), body.is_some())),
        }
    }

    /// Materializes the builder into its final ordered mapping.
    ///
    /// Flattens the entry stack (formatting keys, dropping suppressed
    /// values), then drains the shared registry once, then merges every
    /// resolved mapping into the result in resolution order — later mappings
    /// override same-key earlier ones while keeping first-seen positions.
    ///
    /// This is the only point at which deferred work is forced, and it
    /// consumes the builder: deferred work registered anywhere in the
    /// shared-registry subtree resolves exactly once, here at the root.
    ///
    /// # Errors
    ///
    /// Propagates any store failure or deferred-body failure from the drain;
    /// no partial output is produced.
    pub fn materialize(self) -> Result<ValueMap> {
        let registry = Rc::clone(&self.registry);
        debug!(entries = self.stack.len(), "materializing builder");

        let mut data = self.finish();
        for mapping in registry.resolve()? {
            merge_into(&mut data, mapping);
        }
        Ok(data)
    }

    /// Spawns a child builder: hooks copied, registry and store shared.
    fn inherit(&self) -> Self {
        Self {
            stack: Vec::new(),
            format_key: self.format_key.clone(),
            suppress_value: self.suppress_value.clone(),
            registry: Rc::clone(&self.registry),
            store: Rc::clone(&self.store),
        }
    }

    /// Completes a child builder from the perspective of its parent.
    ///
    /// A child sharing the parent's registry only flattens — its deferred
    /// registrations stay pending for the subtree root to drain in one
    /// batched pass. A child that re-rooted its cache subtree (via
    /// [`cache_store`](Builder::cache_store)) is itself that subtree's root,
    /// so it materializes fully here, draining its own registry.
    fn finish_into(self, parent_registry: &Rc<LazyCache>) -> Result<ValueMap> {
        if Rc::ptr_eq(&self.registry, parent_registry) {
            Ok(self.finish())
        } else {
            self.materialize()
        }
    }

    /// Flattens the entry stack into a mapping without touching the
    /// registry. Child builders finish; only the root materializes.
    fn finish(self) -> ValueMap {
        let Self { stack, format_key, suppress_value, .. } = self;
        let mut data = ValueMap::new();
        for (key, value) in stack {
            let key = match &format_key {
                Some(format) => format(&key),
                None => key,
            };
            if let Some(suppress) = &suppress_value {
                if suppress(&value) {
                    continue;
                }
            }
            data.insert(key, value);
        }
        data
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("entries", &self.stack.len())
            .field("pending_cache_groups", &self.registry.pending_groups())
            .finish()
    }
}
