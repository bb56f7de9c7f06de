//! Integration tests for installing and removing apps.
//!
//! Covers manifest validation, the immutable builtin set, cascading
//! uninstall and persistence of the installed collection.

use std::sync::Arc;

use serde_json::json;
use webdesk_core::ErrorCode;
use webdesk_kernel::HostConfig;
use webdesk_storage::{KvStore, MemoryKvStore};
use webdesk_test::{FlakyKvStore, TestDesk, calc_manifest, calc_manifest_value, invalid_manifests};

async fn installed_ids(desk: &TestDesk) -> Vec<String> {
    desk.handle
        .apps("")
        .await
        .unwrap()
        .iter()
        .map(|m| m.id.as_str().to_owned())
        .collect()
}

#[tokio::test]
async fn test_invalid_manifests_are_refused_and_change_nothing() {
    let mut desk = TestDesk::boot().await;
    let store = desk.launch("appstore").await.unwrap();
    let before = installed_ids(&desk).await;

    for (field, manifest) in invalid_manifests() {
        let err = store
            .client
            .call("registry.install", json!({ "manifest": manifest }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidManifest, "{manifest}");
        assert!(err.message.contains(field), "{} should name {field}", err.message);
    }

    let err = store
        .client
        .call("registry.install", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidManifest);

    assert_eq!(installed_ids(&desk).await, before);
}

#[tokio::test]
async fn test_builtin_ids_cannot_be_replaced_or_removed() {
    let mut desk = TestDesk::boot().await;
    let store = desk.launch("appstore").await.unwrap();

    for id in ["clock", "notes", "appstore"] {
        let mut manifest = calc_manifest_value();
        manifest["id"] = json!(id);
        let err = store
            .client
            .call("registry.install", json!({ "manifest": manifest }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BuiltinConflict);
        assert_eq!(err.message, "Cannot override builtin app id");

        let err = store
            .client
            .call("registry.uninstall", json!({ "appId": id }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BuiltinConflict);
        assert_eq!(err.message, "Cannot uninstall builtin app");
    }

    let clock = desk.handle.apps("clock").await.unwrap();
    assert_eq!(clock.len(), 1);
    assert!(clock[0].builtin);
    assert_eq!(clock[0].name, "Clock");
}

#[tokio::test]
async fn test_uninstalling_unknown_app_fails() {
    let mut desk = TestDesk::boot().await;
    let store = desk.launch("appstore").await.unwrap();

    let err = store
        .client
        .call("registry.uninstall", json!({ "appId": "ghost" }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotInstalled);

    let err = store
        .client
        .call("registry.uninstall", json!({ "appId": 5 }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidParams);
}

#[tokio::test]
async fn test_calc_install_launch_uninstall() {
    let mut desk = TestDesk::boot().await;
    let store = desk.launch("appstore").await.unwrap();

    let installed = store
        .client
        .call("registry.install", json!({ "manifest": calc_manifest_value() }))
        .await
        .unwrap();
    assert_eq!(installed, json!(true));
    assert!(installed_ids(&desk).await.contains(&"calc".to_owned()));

    let listed = store.client.call("registry.list", json!({})).await.unwrap();
    let calc = listed
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == "calc")
        .unwrap();
    assert_eq!(calc["entryUrl"], "./calc.html");

    let calc = desk.launch("calc").await.unwrap();
    assert_eq!(calc.entry_url, "./calc.html");
    assert!(calc.process.id > store.process.id);
    assert_eq!(
        desk.handle.top_window().await.unwrap(),
        Some(calc.process.window_id)
    );

    let removed = store
        .client
        .call("registry.uninstall", json!({ "appId": "calc" }))
        .await
        .unwrap();
    assert_eq!(removed, json!(true));

    let windows = desk.handle.windows().await.unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].app_id.as_str(), "appstore");
    assert_eq!(desk.detached(), vec![calc.surface_id]);
    assert!(!installed_ids(&desk).await.contains(&"calc".to_owned()));
}

#[tokio::test]
async fn test_uninstall_closes_exactly_matching_windows() {
    let mut desk = TestDesk::boot().await;
    desk.handle.install(calc_manifest()).await.unwrap();

    let clock = desk.launch("clock").await.unwrap();
    let first = desk.launch("calc").await.unwrap();
    let notes = desk.launch("notes").await.unwrap();
    let second = desk.launch("calc").await.unwrap();

    let closed = desk.handle.uninstall("calc").await.unwrap();
    assert_eq!(closed, vec![first.process.window_id, second.process.window_id]);

    let processes = desk.handle.processes().await.unwrap();
    assert_eq!(processes, vec![clock.process, notes.process]);

    let mut detached = desk.detached();
    detached.sort_by_key(|s| s.0);
    let mut expected = vec![first.surface_id, second.surface_id];
    expected.sort_by_key(|s| s.0);
    assert_eq!(detached, expected);
}

#[tokio::test]
async fn test_installed_apps_survive_reboot() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());

    let desk = TestDesk::boot_with(HostConfig::default(), Arc::clone(&store)).await;
    desk.handle.install(calc_manifest()).await.unwrap();
    desk.shutdown().await;

    let desk = TestDesk::boot_with(HostConfig::default(), store).await;
    let ids = installed_ids(&desk).await;
    assert_eq!(ids, vec!["clock", "notes", "appstore", "calc"]);
}

#[tokio::test]
async fn test_failed_persist_leaves_registry_unchanged() {
    let flaky = FlakyKvStore::new();
    let mut desk = TestDesk::boot_with(HostConfig::default(), Arc::new(flaky.clone())).await;
    let store = desk.launch("appstore").await.unwrap();

    flaky.set_failing(true);
    let err = store
        .client
        .call("registry.install", json!({ "manifest": calc_manifest_value() }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(!installed_ids(&desk).await.contains(&"calc".to_owned()));

    flaky.set_failing(false);
    store
        .client
        .call("registry.install", json!({ "manifest": calc_manifest_value() }))
        .await
        .unwrap();
    assert!(installed_ids(&desk).await.contains(&"calc".to_owned()));
}
