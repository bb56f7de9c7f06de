//! Integration tests for per-app storage over RPC.

use std::sync::Arc;

use serde_json::{Value, json};
use webdesk_core::ErrorCode;
use webdesk_kernel::HostConfig;
use webdesk_storage::MemoryKvStore;
use webdesk_test::TestDesk;

#[tokio::test]
async fn test_set_then_get_returns_same_value() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();

    let values = [
        json!(null),
        json!(true),
        json!(0),
        json!(-12.5),
        json!(""),
        json!("unicode ✓ text"),
        json!([]),
        json!([1, "two", {"three": [3]}]),
        json!({}),
        json!({"title": "Draft", "tags": ["a", "b"], "nested": {"n": null}}),
    ];
    for (i, value) in values.iter().enumerate() {
        let key = format!("key-{i}");
        let set = notes
            .client
            .call("storage.set", json!({"key": key, "value": value}))
            .await
            .unwrap();
        assert_eq!(set, json!(true));

        let got = notes
            .client
            .call("storage.get", json!({"key": key}))
            .await
            .unwrap();
        assert_eq!(&got, value, "round-trip of {key}");
    }
}

#[tokio::test]
async fn test_get_missing_key_returns_fallback() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();

    let got = notes
        .client
        .call("storage.get", json!({"key": "absent", "fallback": ["empty"]}))
        .await
        .unwrap();
    assert_eq!(got, json!(["empty"]));

    let got = notes
        .client
        .call("storage.get", json!({"key": "absent"}))
        .await
        .unwrap();
    assert_eq!(got, Value::Null);
}

#[tokio::test]
async fn test_list_and_remove() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();

    for key in ["b", "a", "c"] {
        notes
            .client
            .call("storage.set", json!({"key": key, "value": 1}))
            .await
            .unwrap();
    }
    let keys = notes.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!(["a", "b", "c"]));

    let removed = notes
        .client
        .call("storage.remove", json!({"key": "b"}))
        .await
        .unwrap();
    assert_eq!(removed, json!(true));
    // Removing again is not an error.
    notes
        .client
        .call("storage.remove", json!({"key": "b"}))
        .await
        .unwrap();

    let keys = notes.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!(["a", "c"]));
}

#[tokio::test]
async fn test_apps_cannot_see_each_others_keys() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();
    let store = desk.launch("appstore").await.unwrap();

    notes
        .client
        .call("storage.set", json!({"key": "secret", "value": "notes-only"}))
        .await
        .unwrap();

    let got = store
        .client
        .call("storage.get", json!({"key": "secret", "fallback": "nothing"}))
        .await
        .unwrap();
    assert_eq!(got, json!("nothing"));
    let keys = store.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!([]));
}

#[tokio::test]
async fn test_storage_outlives_the_window() {
    let mut desk = TestDesk::boot().await;
    let first = desk.launch("notes").await.unwrap();
    first
        .client
        .call("storage.set", json!({"key": "draft", "value": "hello"}))
        .await
        .unwrap();
    desk.handle
        .close_window(first.process.window_id)
        .await
        .unwrap();

    let second = desk.launch("notes").await.unwrap();
    let got = second
        .client
        .call("storage.get", json!({"key": "draft"}))
        .await
        .unwrap();
    assert_eq!(got, json!("hello"));
}

#[tokio::test]
async fn test_quota_refusal_keeps_prior_value() {
    let config = HostConfig::default().with_storage_quota(100);
    let mut desk = TestDesk::boot_with(config, Arc::new(MemoryKvStore::new())).await;
    let notes = desk.launch("notes").await.unwrap();

    notes
        .client
        .call("storage.set", json!({"key": "doc", "value": "small"}))
        .await
        .unwrap();

    let err = notes
        .client
        .call("storage.set", json!({"key": "doc", "value": "x".repeat(500)}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::QuotaExceeded);

    let err = notes
        .client
        .call("storage.set", json!({"key": "other", "value": "y".repeat(500)}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::QuotaExceeded);

    let got = notes
        .client
        .call("storage.get", json!({"key": "doc"}))
        .await
        .unwrap();
    assert_eq!(got, json!("small"));
    let keys = notes.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!(["doc"]));
}

#[tokio::test]
async fn test_overwrite_is_metered_against_replaced_value() {
    let config = HostConfig::default().with_storage_quota(100);
    let mut desk = TestDesk::boot_with(config, Arc::new(MemoryKvStore::new())).await;
    let notes = desk.launch("notes").await.unwrap();

    // 82 bytes stored; replacing it with 82 more must not count both.
    let big = "a".repeat(80);
    notes
        .client
        .call("storage.set", json!({"key": "doc", "value": big}))
        .await
        .unwrap();
    notes
        .client
        .call("storage.set", json!({"key": "doc", "value": "b".repeat(80)}))
        .await
        .unwrap();

    let report = notes.client.call("storage.quota", json!({})).await.unwrap();
    assert_eq!(report, json!({"used": 82, "softLimit": 100}));
}

#[tokio::test]
async fn test_bad_params_are_rejected() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();

    let err = notes
        .client
        .call("storage.get", json!({"key": 7}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidParams);

    let err = notes
        .client
        .call("storage.set", json!({"value": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidParams);

    let err = notes
        .client
        .call("storage.compact", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownMethod);
}

#[tokio::test]
async fn test_empty_key_is_an_ordinary_key() {
    let mut desk = TestDesk::boot().await;
    let notes = desk.launch("notes").await.unwrap();

    notes
        .client
        .call("storage.set", json!({"key": "", "value": "blank"}))
        .await
        .unwrap();
    let value = notes
        .client
        .call("storage.get", json!({"key": ""}))
        .await
        .unwrap();
    assert_eq!(value, json!("blank"));

    let keys = notes.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!([""]));

    notes
        .client
        .call("storage.remove", json!({"key": ""}))
        .await
        .unwrap();
    let keys = notes.client.call("storage.list", json!({})).await.unwrap();
    assert_eq!(keys, json!([]));
}
