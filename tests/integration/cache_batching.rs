//! Batch composition, cache hits, and recursive drains through the builder.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use treebuild::test_utils::{MemoryStore, RecordingStore};
use treebuild::{Builder, BuilderConfig, CacheKey, CacheOptions, Value};

use super::init_tracing;

fn recording_builder() -> (Rc<RecordingStore<MemoryStore>>, Builder) {
    let store = Rc::new(RecordingStore::new(MemoryStore::new()));
    let builder = Builder::with_config(BuilderConfig::new().shared_store(Rc::clone(&store) as _));
    (store, builder)
}

#[test]
fn test_three_fragments_one_option_set_one_round_trip() {
    init_tracing();

    let (store, mut builder) = recording_builder();
    for name in ["x", "y", "z"] {
        builder.defer_cached([name], CacheOptions::new(), move |cached| {
            cached.set(name, true);
            Ok(())
        });
    }

    let data = builder.materialize().unwrap();

    assert_eq!(Value::Object(data), json!({"x": true, "y": true, "z": true}));
    assert_eq!(store.batch_count(), 1);
    assert_eq!(
        store.batches()[0].keys,
        vec![
            CacheKey::compose(["x"]),
            CacheKey::compose(["y"]),
            CacheKey::compose(["z"]),
        ]
    );
}

#[test]
fn test_distinct_option_sets_split_into_their_own_round_trips() {
    let (store, mut builder) = recording_builder();
    let plain = CacheOptions::new().with("option", false);
    let routed = CacheOptions::new().with("option", true);

    builder.defer_cached(["x"], plain.clone(), |cached| {
        cached.set("x", true);
        Ok(())
    });
    builder.defer_cached(["y"], routed.clone(), |cached| {
        cached.set("y", true);
        Ok(())
    });
    builder.defer_cached(["z"], routed.clone(), |cached| {
        cached.set("z", true);
        Ok(())
    });

    let data = builder.materialize().unwrap();

    assert_eq!(Value::Object(data), json!({"x": true, "y": true, "z": true}));
    let batches = store.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].keys, vec![CacheKey::compose(["x"])]);
    assert_eq!(batches[0].options, plain);
    assert_eq!(batches[1].keys, vec![CacheKey::compose(["y"]), CacheKey::compose(["z"])]);
    assert_eq!(batches[1].options, routed);
}

#[test]
fn test_array_item_fragments_batch_into_one_round_trip() {
    init_tracing();

    let (store, mut builder) = recording_builder();
    builder
        .array("posts", ["first", "second", "third"], |post, slug| {
            post.set("slug", slug);
            post.defer_cached(["posts", slug], CacheOptions::new(), move |cached| {
                cached.set(format!("{slug}_summary"), true);
                Ok(())
            });
            Ok(())
        })
        .unwrap();

    let data = builder.materialize().unwrap();

    // Item registrations accumulate in the shared registry and drain at the
    // root: one store round-trip for all three items, results merged at the
    // top level after the direct entries.
    assert_eq!(
        Value::Object(data),
        json!({
            "posts": [{"slug": "first"}, {"slug": "second"}, {"slug": "third"}],
            "first_summary": true,
            "second_summary": true,
            "third_summary": true,
        })
    );
    assert_eq!(store.batch_count(), 1);
    assert_eq!(
        store.batches()[0].keys,
        vec![
            CacheKey::compose(["posts", "first"]),
            CacheKey::compose(["posts", "second"]),
            CacheKey::compose(["posts", "third"]),
        ]
    );
}

#[test]
fn test_fragment_registered_during_drain_resolves_before_materialize_returns() {
    init_tracing();

    let (store, mut builder) = recording_builder();
    builder.defer_cached(["a"], CacheOptions::new(), |outer| {
        outer.set("a", 1);
        outer.defer_cached(["b"], CacheOptions::new(), |inner| {
            inner.set("b", 2);
            Ok(())
        });
        Ok(())
    });

    let data = builder.materialize().unwrap();

    assert_eq!(Value::Object(data), json!({"a": 1, "b": 2}));
    let batches = store.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].keys, vec![CacheKey::compose(["a"])]);
    assert_eq!(batches[1].keys, vec![CacheKey::compose(["b"])]);
}

#[test]
fn test_warm_store_serves_fragments_without_running_bodies() {
    let store = Rc::new(MemoryStore::new());
    let runs = Rc::new(Cell::new(0));

    for expected in ["hit", "hit"] {
        let mut builder =
            Builder::with_config(BuilderConfig::new().shared_store(Rc::clone(&store) as _));
        let counter = Rc::clone(&runs);
        builder.defer_cached(["cache_key"], CacheOptions::new(), move |cached| {
            counter.set(counter.get() + 1);
            // Only the first build ever runs this; the value below proves it.
            cached.set("cache", "hit");
            Ok(())
        });

        let data = builder.materialize().unwrap();
        assert_eq!(Value::Object(data), json!({"cache": expected}));
    }

    assert_eq!(runs.get(), 1);
}

#[test]
fn test_warm_store_preserves_transitively_registered_fragments() {
    let store = Rc::new(MemoryStore::new());
    let inner_runs = Rc::new(Cell::new(0));

    for round in 0..2 {
        let mut builder =
            Builder::with_config(BuilderConfig::new().shared_store(Rc::clone(&store) as _));
        let counter = Rc::clone(&inner_runs);
        builder.defer_cached(["outer"], CacheOptions::new(), move |outer| {
            outer.set("outer", true);
            outer.defer_cached(["inner"], CacheOptions::new(), move |inner| {
                counter.set(counter.get() + 1);
                inner.set("inner", true);
                Ok(())
            });
            Ok(())
        });

        let data = builder.materialize().unwrap();
        // Round 1 hits the outer fragment, which already embeds the inner
        // mapping spliced during round 0's drain.
        assert_eq!(Value::Object(data), json!({"outer": true, "inner": true}), "round {round}");
    }

    assert_eq!(inner_runs.get(), 1);
}

#[test]
fn test_same_key_reregistration_last_body_wins() {
    let (store, mut builder) = recording_builder();
    builder.defer_cached(["k"], CacheOptions::new(), |cached| {
        cached.set("value", "stale");
        Ok(())
    });
    builder.defer_cached(["k"], CacheOptions::new(), |cached| {
        cached.set("value", "fresh");
        Ok(())
    });

    let data = builder.materialize().unwrap();

    assert_eq!(Value::Object(data), json!({"value": "fresh"}));
    assert_eq!(store.batches()[0].keys, vec![CacheKey::compose(["k"])]);
}
