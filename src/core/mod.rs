//! Core types shared across the crate.
//!
//! This module hosts the error taxonomy ([`BuildError`]) and the crate-wide
//! [`Result`] alias. Every fallible operation in `treebuild` surfaces its
//! failure synchronously through these types; nothing is retried and no
//! partial output survives an error.

pub mod error;

pub use error::{BuildError, Result};
