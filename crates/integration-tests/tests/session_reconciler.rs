//! Reconciliation behavior against the fake backend.
//!
//! Each test scripts the validity of the three credential channels and
//! observes both the resulting state and which endpoints the client
//! actually consulted.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use veritas_client::config::ClientConfig;
use veritas_client::session::Reconciler;
use veritas_integration_tests::{FakeBackend, TEST_PASSWORD, TEST_TOKEN};

fn reconciler_for(backend: &FakeBackend, dir: &TempDir) -> Reconciler {
    let mut config = ClientConfig::new(&backend.base_url()).unwrap();
    config.cache_path = dir.path().join("session.json");
    Reconciler::new(&config).unwrap()
}

/// Write a fully populated cache file, as a previous process would have
/// left behind after a confirmed validation.
fn seed_cache(dir: &TempDir, username: &str, token: &str) {
    std::fs::write(
        dir.path().join("session.json"),
        json!({
            "user": {
                "id": 1,
                "username": username,
                "email": format!("{username}@example.com"),
            },
            "is_authenticated": true,
            "jwt_token": token,
        })
        .to_string(),
    )
    .unwrap();
}

/// Poll until `f` is true or a short deadline passes (for fire-and-forget
/// effects like the session refresh).
async fn eventually(f: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}

#[tokio::test]
async fn accepted_token_short_circuits_session_validation() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, "alice", TEST_TOKEN);
    backend.set_token_valid(true);
    backend.set_session_valid(true);

    let reconciler = reconciler_for(&backend, &dir);
    reconciler.initialize().await;
    assert!(reconciler.validate().await);

    assert!(backend.hits().validate_jwt.load(Ordering::SeqCst) >= 1);
    assert_eq!(backend.hits().validate_session.load(Ordering::SeqCst), 0);
    assert_eq!(backend.hits().check_auth.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_token_falls_back_to_session_validation() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, "alice", TEST_TOKEN);
    backend.set_token_valid(false);
    backend.set_session_valid(true);

    let reconciler = reconciler_for(&backend, &dir);
    reconciler.initialize().await;
    assert!(reconciler.validate().await);

    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "alice");
    assert!(backend.hits().validate_jwt.load(Ordering::SeqCst) >= 1);
    assert!(backend.hits().validate_session.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn session_success_rewrites_cache_and_fires_refresh() {
    // Cache says alice with token "abc"; the token is rejected but the
    // ambient session is valid.
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, "alice", "abc");
    backend.set_session_valid(true);

    let reconciler = reconciler_for(&backend, &dir);
    reconciler.initialize().await;
    assert!(reconciler.validate().await);

    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "alice");

    // Cache rewritten by the session path: identity present, but no token
    // (the rejected one must not survive).
    let cache: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(cache["user"]["username"], "alice");
    assert_eq!(cache["is_authenticated"], json!(true));
    assert_eq!(cache.get("jwt_token"), Some(&serde_json::Value::Null));

    // The fire-and-forget refresh call lands shortly after.
    assert!(
        eventually(|| backend.hits().refresh_session.load(Ordering::SeqCst) >= 1).await,
        "refresh-session was never called"
    );
}

#[tokio::test]
async fn legacy_fallback_authenticates_when_modern_channels_fail() {
    // No cache, session invalid, legacy check recognizes bob.
    let backend = FakeBackend::spawn("bob").await;
    let dir = tempfile::tempdir().unwrap();
    backend.set_legacy_valid(true);

    let reconciler = reconciler_for(&backend, &dir);
    assert!(reconciler.validate().await);

    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "bob");
    assert!(backend.hits().validate_session.load(Ordering::SeqCst) >= 1);
    assert!(backend.hits().check_auth.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn exhausted_fallbacks_clear_state_and_cache() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, "alice", TEST_TOKEN);

    let reconciler = reconciler_for(&backend, &dir);
    assert!(!reconciler.validate().await);

    let snapshot = reconciler.snapshot();
    assert!(!snapshot.authenticated);
    assert!(snapshot.identity.is_none());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn initialize_restores_optimistically_then_converges_to_logged_out() {
    // Fully populated cache, but the server now rejects everything.
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, "alice", TEST_TOKEN);

    let reconciler = reconciler_for(&backend, &dir);
    let mut updates = reconciler.subscribe();
    reconciler.initialize().await;

    // The optimistic restore is visible immediately...
    let first = updates.borrow_and_update().clone();
    assert!(first.authenticated);
    assert_eq!(first.identity.unwrap().username, "alice");

    // ...and the background confirmation tears it down within one cycle.
    assert!(
        eventually(|| !reconciler.snapshot().authenticated).await,
        "optimistic state was never invalidated"
    );
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn initialize_with_partial_cache_asks_the_server() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    // Two of the three fields: not restorable.
    std::fs::write(
        dir.path().join("session.json"),
        json!({"is_authenticated": true, "jwt_token": TEST_TOKEN}).to_string(),
    )
    .unwrap();
    backend.set_session_valid(true);

    let reconciler = reconciler_for(&backend, &dir);
    reconciler.initialize().await;

    // No optimistic restore happened; the server was consulted inline.
    assert!(backend.hits().validate_session.load(Ordering::SeqCst) >= 1);
    assert!(reconciler.snapshot().authenticated);
}

#[tokio::test]
async fn repeated_validation_maintains_the_identity_invariant() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    let reconciler = reconciler_for(&backend, &dir);

    // Flip server-side validity back and forth; after every pass the
    // snapshot must satisfy authenticated ⇒ identity present.
    for round in 0..6 {
        backend.set_session_valid(round % 2 == 0);
        reconciler.validate().await;

        let snapshot = reconciler.snapshot();
        if snapshot.authenticated {
            assert!(snapshot.identity.is_some());
        } else {
            assert!(snapshot.identity.is_none());
        }
    }
}

#[tokio::test]
async fn fresh_login_survives_a_stale_validation_pass() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    let reconciler = reconciler_for(&backend, &dir);

    // A validation pass gets stuck on a slow session check...
    backend.set_session_delay(Duration::from_millis(300));
    let slow_pass = {
        let r = reconciler.clone();
        tokio::spawn(async move { r.validate().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // ...the user logs in while it is in flight...
    reconciler.login("alice", TEST_PASSWORD).await.unwrap();
    // ...and the server expires both channels again, so the stuck pass
    // will come back empty-handed.
    backend.set_session_valid(false);
    backend.set_token_valid(false);

    slow_pass.await.unwrap();

    // The stale pass must not wipe the login.
    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "alice");
    let cache: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(cache["jwt_token"], TEST_TOKEN);
}

#[tokio::test]
async fn stale_pass_result_is_discarded_after_a_newer_pass_commits() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    let reconciler = reconciler_for(&backend, &dir);

    // Old pass: stuck on a slow session check that will report invalid.
    backend.set_session_delay(Duration::from_millis(300));
    let old_pass = {
        let r = reconciler.clone();
        tokio::spawn(async move { r.validate().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Newer pass: runs to completion first and authenticates via the
    // legacy check.
    backend.set_session_delay(Duration::ZERO);
    backend.set_legacy_valid(true);
    assert!(reconciler.validate().await);

    // Release the old pass; it exhausts every channel (the legacy flag is
    // off again by the time it gets there) but its clear is stale.
    backend.set_legacy_valid(false);
    old_pass.await.unwrap();

    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "alice");
    assert!(dir.path().join("session.json").exists());
}

#[tokio::test]
async fn overlapping_validations_leave_consistent_state() {
    let backend = FakeBackend::spawn("alice").await;
    let dir = tempfile::tempdir().unwrap();
    backend.set_session_valid(true);

    let reconciler = reconciler_for(&backend, &dir);

    // Concurrent passes (timer vs. idle vs. manual in production) must
    // not corrupt state: last response wins, wholesale.
    let passes: Vec<_> = (0..4)
        .map(|_| {
            let r = reconciler.clone();
            tokio::spawn(async move { r.validate().await })
        })
        .collect();
    for pass in passes {
        pass.await.unwrap();
    }

    let snapshot = reconciler.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.identity.unwrap().username, "alice");
}
