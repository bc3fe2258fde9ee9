//! Builder verbs, hook inheritance, and materialized output shape.

use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;
use treebuild::{Builder, BuilderConfig, CacheOptions, Value};

use super::init_tracing;

#[derive(Serialize)]
struct Post {
    title: &'static str,
    content: &'static str,
    hashtags: Vec<&'static str>,
}

#[derive(Serialize)]
struct Comment {
    author: &'static str,
    content: &'static str,
}

fn post() -> Post {
    Post {
        title: "Lazy caches",
        content: "Batch all the things.",
        hashtags: vec!["caching", "batching"],
    }
}

fn comments() -> Vec<Comment> {
    vec![
        Comment { author: "ada", content: "one" },
        Comment { author: "alan", content: "two" },
    ]
}

#[test]
fn test_end_to_end_direct_nested_and_cached_entries() {
    init_tracing();

    let mut builder = Builder::new();
    builder.set("name", "X");
    builder
        .nested("meta", |meta| {
            meta.set("visible", true);
            Ok(())
        })
        .unwrap();
    builder.defer_cached(["k"], CacheOptions::new(), |cached| {
        cached.set("cached", true);
        Ok(())
    });

    let data = builder.materialize().unwrap();

    assert_eq!(
        Value::Object(data),
        json!({ "name": "X", "meta": { "visible": true }, "cached": true })
    );
}

#[test]
fn test_full_document_flow() {
    init_tracing();

    let post = post();
    let mut builder = Builder::new();
    builder.extract(&post, &["title", "content"]).unwrap();
    builder
        .nested("meta", |meta| {
            meta.set("hashtags", post.hashtags.clone());
            meta.set("draft", false);
            Ok(())
        })
        .unwrap();
    builder
        .array("comments", comments(), |comment_builder, comment| {
            comment_builder.extract(&comment, &["author", "content"])
        })
        .unwrap();

    let data = builder.materialize().unwrap();

    assert_eq!(
        Value::Object(data),
        json!({
            "title": "Lazy caches",
            "content": "Batch all the things.",
            "meta": { "hashtags": ["caching", "batching"], "draft": false },
            "comments": [
                { "author": "ada", "content": "one" },
                { "author": "alan", "content": "two" },
            ],
        })
    );
}

#[test]
fn test_output_serializes_in_insertion_order() {
    let mut builder = Builder::new();
    builder.set("zulu", 1);
    builder.set("alpha", 2);
    builder.set("mike", 3);

    let data = builder.materialize().unwrap();
    let rendered = serde_json::to_string(&data).unwrap();

    assert_eq!(rendered, r#"{"zulu":1,"alpha":2,"mike":3}"#);
}

#[test]
fn test_config_hooks_flow_down_the_whole_tree() {
    let config = BuilderConfig::new()
        .format_key(|key| key.to_uppercase())
        .suppress_value(|value| value.is_null());
    let mut builder = Builder::with_config(config);

    builder.set("name", "X");
    builder.set("gone", Value::Null);
    builder
        .nested("meta", |meta| {
            meta.set("inner_gone", Value::Null);
            meta.set("visible", true);
            Ok(())
        })
        .unwrap();
    builder
        .array("items", [1, 2], |item_builder, n| {
            item_builder.set("n", n);
            item_builder.set("noise", Value::Null);
            Ok(())
        })
        .unwrap();

    let data = builder.materialize().unwrap();

    assert_eq!(
        Value::Object(data),
        json!({
            "NAME": "X",
            "META": { "VISIBLE": true },
            "ITEMS": [{ "N": 1 }, { "N": 2 }],
        })
    );
}

#[test]
fn test_deep_nesting_keeps_isolation_per_level() {
    let mut builder = Builder::new();
    builder
        .nested("outer", |outer| {
            outer.format_key(|key| format!("o_{key}"));
            outer.set("tag", 1);
            outer.nested("inner", |inner| {
                inner.format_key(|key| format!("i_{key}"));
                inner.set("tag", 2);
                Ok(())
            })
        })
        .unwrap();
    builder.set("tag", 0);

    let data = builder.materialize().unwrap();

    // Each level applies only its own hook; the nested key itself is
    // formatted by the level that owns the entry.
    assert_eq!(
        Value::Object(data),
        json!({
            "outer": { "o_tag": 1, "o_inner": { "i_tag": 2 } },
            "tag": 0,
        })
    );
}

#[test]
fn test_cached_fragment_overrides_direct_entry_on_key_collision() {
    let mut builder = Builder::new();
    builder.set("status", "direct");
    builder.set("kept", true);
    builder.defer_cached(["status"], CacheOptions::new(), |cached| {
        cached.set("status", "cached");
        Ok(())
    });

    let data = builder.materialize().unwrap();

    // Resolved mappings merge after direct entries: later value wins, the
    // first occurrence keeps its position.
    let keys: Vec<&String> = data.keys().collect();
    assert_eq!(keys, ["status", "kept"]);
    assert_eq!(data["status"], json!("cached"));
}
