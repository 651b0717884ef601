//! Notification Poller driven by the paused tokio clock

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Fault, MockBackend, build_client, login_as, reservation_json};
use http::Method;
use rental_client::storage::TOKEN_KEY;
use rental_client::{ChangeKind, KeyValueStore, MemoryStore, ReservationStatus, SessionState};
use serde_json::json;
use tokio::time::{sleep, timeout};

const MY_RESERVATIONS: &str = "reservations/my";
const UNREAD: &str = "notifications/unread-count";

/// Let spawned tasks run without moving past the next poll
async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_is_baseline_then_changes_are_reported() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    let client = build_client(&backend, &store);
    let mut changes = client.subscribe_changes();

    assert_eq!(client.start().await, SessionState::Anonymous);

    backend.once(Method::GET, MY_RESERVATIONS, 200, json!([reservation_json(1, "pending")]));
    backend.always(Method::GET, UNREAD, 200, json!({"count": 0}));
    login_as(&client, &backend, "user").await;
    settle().await;

    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), 1);
    assert_eq!(client.gateway().reservations().await.len(), 1);
    assert!(changes.try_recv().is_err());
    assert!(!client.snackbar().is_visible());

    backend.once(
        Method::GET,
        MY_RESERVATIONS,
        200,
        json!([reservation_json(1, "approved"), reservation_json(2, "pending")]),
    );
    sleep(Duration::from_secs(15)).await;
    settle().await;

    let first = timeout(Duration::from_secs(1), changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, "1");
    assert_eq!(
        first.kind,
        ChangeKind::StatusChanged {
            from: ReservationStatus::Pending,
            to: ReservationStatus::Approved,
        }
    );
    let second = timeout(Duration::from_secs(1), changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.id, "2");
    assert_eq!(second.kind, ChangeKind::Created);
    assert!(changes.try_recv().is_err());

    let shown = client.snackbar().current();
    assert!(shown.visible);
    assert_eq!(shown.message, "New reservation #2");

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_keeps_polling() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    let client = build_client(&backend, &store);
    let mut changes = client.subscribe_changes();
    client.start().await;

    backend.fail_once(Method::GET, MY_RESERVATIONS, Fault::Connection);
    backend.once(Method::GET, MY_RESERVATIONS, 200, json!([reservation_json(1, "pending")]));
    backend.once(
        Method::GET,
        MY_RESERVATIONS,
        200,
        json!([reservation_json(1, "pending"), reservation_json(3, "pending")]),
    );
    login_as(&client, &backend, "user").await;
    settle().await;

    // failure: nothing cached, session intact
    assert!(client.gateway().reservations().await.is_empty());
    assert_eq!(client.session().state(), SessionState::Authenticated);
    assert!(!client.snackbar().is_visible());

    sleep(Duration::from_secs(15)).await;
    settle().await;
    assert_eq!(client.gateway().reservations().await.len(), 1);
    assert!(changes.try_recv().is_err());

    sleep(Duration::from_secs(15)).await;
    settle().await;
    let change = timeout(Duration::from_secs(1), changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.id, "3");
    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), 3);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_polling_after_logout() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    let client = build_client(&backend, &store);
    client.start().await;

    backend.always(Method::GET, MY_RESERVATIONS, 200, json!([]));
    backend.always(Method::GET, UNREAD, 200, json!({"count": 0}));
    login_as(&client, &backend, "user").await;
    settle().await;
    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), 1);
    assert_eq!(backend.calls_to(Method::GET, UNREAD), 1);

    client.logout().await;
    settle().await;
    sleep(Duration::from_secs(120)).await;

    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), 1);
    assert_eq!(backend.calls_to(Method::GET, UNREAD), 1);

    // a new session resumes polling
    login_as(&client, &backend, "user").await;
    settle().await;
    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), 2);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unread_increase_shows_snackbar() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    let client = build_client(&backend, &store);
    client.start().await;

    backend.always(Method::GET, MY_RESERVATIONS, 200, json!([]));
    backend.once(Method::GET, UNREAD, 200, json!({"count": 1}));
    backend.once(Method::GET, UNREAD, 200, json!({"unreadCount": 3}));
    login_as(&client, &backend, "user").await;
    settle().await;

    // baseline only
    assert_eq!(client.gateway().unread_count(), 1);
    assert!(!client.snackbar().is_visible());

    sleep(Duration::from_secs(30)).await;
    settle().await;

    assert_eq!(client.gateway().unread_count(), 3);
    let shown = client.snackbar().current();
    assert!(shown.visible);
    assert_eq!(shown.message, "You have 3 unread notifications");

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_degraded_session_still_polls() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    store.set(TOKEN_KEY, "tok-kept".into()).await.unwrap();
    backend.fail_once(Method::GET, "auth/profile", Fault::Timeout);
    backend.always(Method::GET, MY_RESERVATIONS, 200, json!([]));
    let client = build_client(&backend, &store);

    assert_eq!(client.start().await, SessionState::Degraded);
    settle().await;

    let polls: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|call| call.path == MY_RESERVATIONS)
        .collect();
    assert_eq!(polls.len(), 1);
    assert_eq!(polls[0].bearer.as_deref(), Some("tok-kept"));

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_poller() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());
    let client = build_client(&backend, &store);
    client.start().await;

    backend.always(Method::GET, MY_RESERVATIONS, 200, json!([]));
    login_as(&client, &backend, "user").await;
    settle().await;

    client.shutdown().await;
    let before = backend.calls_to(Method::GET, MY_RESERVATIONS);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.calls_to(Method::GET, MY_RESERVATIONS), before);
}
