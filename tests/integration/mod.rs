//! Integration test suite for treebuild
//!
//! End-to-end scenarios driving the public API the way an embedding
//! application would: building nested output, deferring cached fragments,
//! and asserting on the store round-trips the resolver performs.
//!
//! # Running
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **builder_flow**: builder verbs, hook inheritance, materialized output
//! - **cache_batching**: batch composition, cache hits, recursive drains
//! - **dispatch_shapes**: the positional dispatch surface and its errors

mod builder_flow;
mod cache_batching;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Installs a test subscriber once; honors `RUST_LOG` for drain tracing.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
