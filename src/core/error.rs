//! Error handling for treebuild.
//!
//! The error system is a single strongly-typed enum, [`BuildError`], covering
//! the three failure categories of the crate:
//!
//! - **Usage** — a builder verb was driven through [`dispatch`] with an
//!   argument/body combination that matches none of the three valid call
//!   shapes. The message names the valid shapes and what was received.
//! - **Access** — [`extract`] referenced a field that is not part of the
//!   source object's serialized form ([`BuildError::Access`],
//!   [`BuildError::NonObjectSource`], [`BuildError::Serialization`]). These
//!   are hard failures so builder/schema mismatches surface early instead of
//!   producing silently incomplete output.
//! - **Store** — the external cache store failed mid-batch
//!   ([`BuildError::Store`]) or violated its protocol by asking for a key
//!   that was never registered ([`BuildError::UnknownCacheKey`]). Either one
//!   aborts the whole materialize call; unresolved groups are discarded.
//!
//! All errors propagate to the immediate caller. There is no fatal versus
//! recoverable split: every error aborts the current build.
//!
//! # Examples
//!
//! ```
//! use treebuild::{BuildError, Builder};
//!
//! let mut builder = Builder::new();
//! let err = builder.dispatch("meta", &[], None).unwrap_err();
//! assert!(matches!(err, BuildError::Usage { .. }));
//! ```
//!
//! [`dispatch`]: crate::Builder::dispatch
//! [`extract`]: crate::Builder::extract

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// The error type for all treebuild operations.
///
/// Variants carry the context needed to pinpoint the failing call site:
/// the offending key, the requested field, or the underlying store failure.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A dispatched builder verb received an invalid argument/body shape.
    ///
    /// The valid shapes are: one argument without a body (set), zero
    /// arguments with a body (nested object), or one collection argument
    /// with a body (object array).
    #[error(
        "invalid call shape for `{key}`: received {received}; expected 1 argument without a body \
         (set), 0 arguments with a body (nested object), or 1 collection argument with a body \
         (object array)"
    )]
    Usage {
        /// The key the verb was dispatched under.
        key: String,
        /// Description of the received shape (argument count and body presence).
        received: String,
    },

    /// An extraction referenced a field absent from the source's serialized form.
    #[error("no field `{field}` in the extraction source's serialized form")]
    Access {
        /// The field that was requested but not found.
        field: String,
    },

    /// An extraction source serialized to something other than an object.
    #[error("extraction source must serialize to an object, got {actual}")]
    NonObjectSource {
        /// Kind of value the source actually serialized to.
        actual: &'static str,
    },

    /// An extraction source failed to serialize at all.
    #[error("extraction source failed to serialize: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The external cache store failed while serving a fetch.
    ///
    /// The registry never retries: the error aborts the entire materialize
    /// call and any groups not yet processed are dropped unresolved.
    #[error("cache store {operation} failed")]
    Store {
        /// The store operation that failed (`fetch` or `fetch_batch`).
        operation: String,
        /// The store's underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// The cache store invoked the compute callback for a key that was
    /// never part of the batch it was given.
    #[error("cache store requested computation for unregistered key `{key}`")]
    UnknownCacheKey {
        /// The key the store asked for.
        key: String,
    },
}

impl BuildError {
    /// Builds a [`BuildError::Usage`] from a received argument count and
    /// body presence.
    pub fn usage(key: impl Into<String>, args: usize, with_body: bool) -> Self {
        let received = format!(
            "{args} argument{} {}",
            if args == 1 { "" } else { "s" },
            if with_body { "with a body" } else { "without a body" },
        );
        Self::Usage { key: key.into(), received }
    }

    /// Wraps an external store failure for the given operation.
    pub fn store(operation: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Store { operation: operation.into(), source }
    }
}
