//! Integration tests for window stacking, visibility and geometry as the
//! shell chrome drives them.

use webdesk_core::{ErrorCode, RpcError};
use webdesk_events::ShellEvent;
use webdesk_kernel::{FocusOptions, KernelError, Visibility};
use webdesk_test::TestDesk;

#[tokio::test]
async fn test_top_window_after_minimizing_two_most_recent() {
    let mut desk = TestDesk::boot().await;
    let first = desk.launch("clock").await.unwrap().process.window_id;
    let second = desk.launch("notes").await.unwrap().process.window_id;
    let third = desk.launch("clock").await.unwrap().process.window_id;

    desk.handle.minimize(third).await.unwrap();
    desk.handle.minimize(second).await.unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), Some(first));

    desk.handle.minimize(first).await.unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), None);
    // Minimized windows stay alive.
    assert_eq!(desk.handle.windows().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_dock_click_toggles_minimized_state() {
    let mut desk = TestDesk::boot().await;
    let first = desk.launch("clock").await.unwrap().process.window_id;
    let second = desk.launch("notes").await.unwrap().process.window_id;

    desk.handle.minimize(first).await.unwrap();
    desk.handle
        .focus(first, FocusOptions::toggle_minimize())
        .await
        .unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), Some(first));

    desk.handle
        .focus(first, FocusOptions::toggle_minimize())
        .await
        .unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), Some(second));

    let windows = desk.handle.windows().await.unwrap();
    let info = windows.iter().find(|w| w.window_id == first).unwrap();
    assert_eq!(info.visibility, Visibility::Minimized);
}

#[tokio::test]
async fn test_plain_focus_raises_without_restoring() {
    let mut desk = TestDesk::boot().await;
    let first = desk.launch("clock").await.unwrap().process.window_id;
    let second = desk.launch("notes").await.unwrap().process.window_id;

    desk.handle
        .focus(first, FocusOptions::default())
        .await
        .unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), Some(first));

    desk.handle.minimize(second).await.unwrap();
    desk.handle
        .focus(second, FocusOptions::default())
        .await
        .unwrap();
    assert_eq!(desk.handle.top_window().await.unwrap(), Some(first));
}

#[tokio::test]
async fn test_launch_publishes_window_and_process_events() {
    let mut desk = TestDesk::boot().await;
    let mut events = desk.handle.subscribe();

    let clock = desk.launch("clock").await.unwrap();
    let kinds: Vec<&str> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(kinds, vec!["window.opened", "window.focused", "process.started"]);

    desk.handle.minimize(clock.process.window_id).await.unwrap();
    desk.handle
        .focus(clock.process.window_id, FocusOptions::toggle_minimize())
        .await
        .unwrap();
    desk.handle
        .toggle_maximize(clock.process.window_id)
        .await
        .unwrap();
    desk.handle
        .toggle_maximize(clock.process.window_id)
        .await
        .unwrap();
    desk.handle
        .close_window(clock.process.window_id)
        .await
        .unwrap();

    let kinds: Vec<&str> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(
        kinds,
        vec![
            "window.minimized",
            "window.focused",
            "window.restored",
            "window.maximized",
            "window.restored_size",
            "window.closed",
        ]
    );
}

#[tokio::test]
async fn test_unknown_app_launch_reports_and_leaves_others_running() {
    let mut desk = TestDesk::boot().await;
    let clock = desk.launch("clock").await.unwrap();
    let mut events = desk.handle.subscribe();

    let err = desk.handle.launch("ghost").await.unwrap_err();
    assert!(matches!(err, KernelError::AppNotFound(ref id) if id.as_str() == "ghost"));
    assert_eq!(RpcError::from(err).code, ErrorCode::AppNotFound);

    let failed = events.try_recv().unwrap();
    assert!(matches!(
        failed.as_ref(),
        ShellEvent::LaunchFailed { app_id, .. } if app_id.as_str() == "ghost"
    ));
    assert_eq!(desk.handle.processes().await.unwrap(), vec![clock.process]);
}

#[tokio::test]
async fn test_close_top_window_walks_the_stack() {
    let mut desk = TestDesk::boot().await;
    let first = desk.launch("clock").await.unwrap().process.window_id;
    let second = desk.launch("notes").await.unwrap().process.window_id;

    assert_eq!(desk.handle.close_top_window().await.unwrap(), Some(second));
    assert_eq!(desk.handle.close_top_window().await.unwrap(), Some(first));
    assert_eq!(desk.handle.close_top_window().await.unwrap(), None);
    assert!(desk.handle.processes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_window_rejects_further_operations() {
    let mut desk = TestDesk::boot().await;
    let window_id = desk.launch("clock").await.unwrap().process.window_id;
    desk.handle.close_window(window_id).await.unwrap();

    assert!(matches!(
        desk.handle.minimize(window_id).await,
        Err(KernelError::WindowNotFound(id)) if id == window_id
    ));
    assert!(matches!(
        desk.handle.close_window(window_id).await,
        Err(KernelError::WindowNotFound(_))
    ));
}

#[tokio::test]
async fn test_windows_are_placed_and_kept_inside_content_area() {
    let mut desk = TestDesk::boot().await;
    let window_id = desk.launch("notes").await.unwrap().process.window_id;

    let info = desk.handle.windows().await.unwrap().remove(0);
    assert_eq!((info.rect.width, info.rect.height), (800.0, 550.0));
    assert!((100.0..300.0).contains(&info.rect.left));
    assert!((80.0..180.0).contains(&info.rect.top));
    assert_eq!(info.title, "Notes");

    let rect = desk.handle.move_window(window_id, -50.0, 5000.0).await.unwrap();
    assert_eq!((rect.left, rect.top), (0.0, 250.0));

    let rect = desk.handle.resize_window(window_id, 10.0, 10.0).await.unwrap();
    assert_eq!((rect.width, rect.height), (320.0, 200.0));

    desk.handle.toggle_maximize(window_id).await.unwrap();
    desk.handle.set_content_area(1024.0, 600.0).await.unwrap();
    let info = desk.handle.windows().await.unwrap().remove(0);
    assert!(info.maximized);
    assert_eq!((info.rect.width, info.rect.height), (1024.0, 600.0));

    assert!(matches!(
        desk.handle.set_content_area(0.0, 600.0).await,
        Err(KernelError::InvalidGeometry(_))
    ));
}
