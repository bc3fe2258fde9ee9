//! treebuild - recursive structure builder with batched lazy caching
//!
//! A hook-configurable builder that assembles nested key/value structures
//! (objects, arrays of objects) from arbitrary data sources, with an
//! optional mechanism to defer sub-structures through an external cache
//! supporting multi-key fetch. Many independent subtrees of one output can
//! register "compute this, keyed by X, under cache options O"; forcing the
//! build resolves all of them with the minimum number of batched round-trips
//! to the store — one per distinct option set per resolution pass, even when
//! resolving a batch registers further deferred work.
//!
//! # Architecture Overview
//!
//! - [`Builder`] accumulates an ordered entry stack and materializes it into
//!   an ordered mapping. Nested objects, arrays, and deferred cached blocks
//!   run against child builders inheriting the parent's hooks; the cache
//!   registry is shared by reference across the whole inheritance subtree.
//! - [`LazyCache`] is the deferred-work registry: option-grouped
//!   registrations, batched resolution, and a recursive drain that picks up
//!   registrations made *during* resolution and splices their results
//!   directly after the entry that spawned them.
//! - [`CacheStore`] is the external boundary — an opaque fetch-or-compute
//!   backend. [`NullStore`] (no caching) is the default.
//! - Output is built on `serde_json` with `preserve_order`: insertion-ordered
//!   mappings ([`ValueMap`]) ready for direct serialization.
//!
//! # Core Modules
//!
//! - [`builder`] - the recursive builder and its dispatch surface
//! - [`cache`] - deferred registry, store boundary, durable key composition
//! - [`config`] - explicit root configuration (hooks, store); no globals
//! - [`core`] - error taxonomy and `Result` alias
//! - [`value`] - output data model re-exports and merge helpers
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use treebuild::{Builder, CacheOptions, Value};
//!
//! let mut builder = Builder::new();
//! builder.set("name", "X");
//! builder.nested("meta", |meta| {
//!     meta.set("visible", true);
//!     Ok(())
//! })?;
//! builder.defer_cached(["k"], CacheOptions::new(), |cached| {
//!     cached.set("cached", true);
//!     Ok(())
//! });
//!
//! let data = builder.materialize()?;
//! assert_eq!(
//!     Value::Object(data),
//!     json!({ "name": "X", "meta": { "visible": true }, "cached": true })
//! );
//! # Ok::<(), treebuild::BuildError>(())
//! ```
//!
//! # Concurrency Model
//!
//! Strictly single-threaded and synchronous. Builders, registry, and store
//! references use `Rc`; resolution runs store calls and deferred bodies
//! inline to completion. Nothing here is `Send`, by design.

pub mod builder;
pub mod cache;
pub mod config;
pub mod core;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use builder::{Builder, DispatchBody};
pub use cache::{CacheKey, CacheOptions, CacheStore, LazyCache, NullStore, Thunk};
pub use config::{BuilderConfig, KeyFormat, ValueFilter};
pub use core::{BuildError, Result};
pub use value::{Fragment, Value, ValueMap};
