//! Output data model.
//!
//! Builders materialize into ordered mappings built on `serde_json` with the
//! `preserve_order` feature, so key order is insertion order and the result
//! serializes directly to any self-describing format. Re-exported here so
//! downstream code never spells out the `serde_json` types.

/// A single output value: scalar, ordered mapping, or sequence.
pub use serde_json::Value;

/// An ordered mapping of formatted key to [`Value`].
///
/// With `preserve_order` enabled, re-inserting an existing key replaces the
/// value but keeps the key's original position — exactly the override rule
/// the builder's entry stack requires.
pub type ValueMap = serde_json::Map<String, Value>;

/// The unit the cache store holds for one cache key: the key's own
/// materialized mapping followed by every mapping contributed by deferred
/// work registered while that key was being computed.
///
/// Caching the whole fragment keeps transitively-registered content
/// available on later cache hits without re-running any deferred work.
pub type Fragment = Vec<ValueMap>;

/// Merges `source` into `target` pair by pair, in `source` iteration order.
///
/// A later pair for an existing key overrides the value while keeping the
/// key's first-seen position.
pub fn merge_into(target: &mut ValueMap, source: ValueMap) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Human-readable kind name for a [`Value`], for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
