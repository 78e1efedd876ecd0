//! Test harness for the Veritas session client.
//!
//! Provides [`FakeBackend`], an in-process axum implementation of the
//! backend's auth endpoints with scriptable validity switches and
//! per-endpoint hit counters, so tests can observe exactly which
//! credential channels the client consulted and in what circumstances.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)] // test harness

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// The bearer token the fake backend recognizes.
pub const TEST_TOKEN: &str = "test-token-1";
/// The password the fake backend accepts for any known user.
pub const TEST_PASSWORD: &str = "hunter22";

/// Per-endpoint request counters.
#[derive(Debug, Default)]
pub struct Hits {
    pub login: AtomicU64,
    pub register: AtomicU64,
    pub validate_jwt: AtomicU64,
    pub validate_session: AtomicU64,
    pub check_auth: AtomicU64,
    pub refresh_session: AtomicU64,
    pub logout: AtomicU64,
}

struct BackendState {
    username: String,
    token_valid: AtomicBool,
    session_valid: AtomicBool,
    legacy_valid: AtomicBool,
    /// Artificial latency for `/validate-session`, in milliseconds, for
    /// tests that need one validation pass to outlive another operation.
    session_delay_ms: AtomicU64,
    hits: Hits,
}

impl BackendState {
    async fn session_delay(&self) {
        let delay = self.session_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
    }
}

impl BackendState {
    fn user_json(&self) -> Value {
        json!({
            "id": 1,
            "username": self.username,
            "email": format!("{}@example.com", self.username),
        })
    }
}

/// An in-process fake of the Veritas backend's auth surface.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl FakeBackend {
    /// Spawn a backend for `username` with every credential channel
    /// initially invalid.
    pub async fn spawn(username: &str) -> Self {
        let state = Arc::new(BackendState {
            username: username.to_owned(),
            token_valid: AtomicBool::new(false),
            session_valid: AtomicBool::new(false),
            legacy_valid: AtomicBool::new(false),
            session_delay_ms: AtomicU64::new(0),
            hits: Hits::default(),
        });

        let app = axum::Router::new()
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/validate-jwt", get(validate_jwt))
            .route("/validate-session", get(validate_session))
            .route("/check-auth", get(check_auth))
            .route("/refresh-session", post(refresh_session))
            .route("/logout", post(logout))
            .route("/user/profile-jwt", get(profile_jwt))
            .route("/user/profile", get(profile))
            .route("/user/stats", get(user_stats))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    /// Base URL for pointing a `ClientConfig` at this backend.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Whether `/validate-jwt` accepts [`TEST_TOKEN`].
    pub fn set_token_valid(&self, valid: bool) {
        self.state.token_valid.store(valid, Ordering::SeqCst);
    }

    /// Whether the cookie-session endpoints report an authenticated session.
    pub fn set_session_valid(&self, valid: bool) {
        self.state.session_valid.store(valid, Ordering::SeqCst);
    }

    /// Whether the legacy `/check-auth` endpoint reports authenticated.
    pub fn set_legacy_valid(&self, valid: bool) {
        self.state.legacy_valid.store(valid, Ordering::SeqCst);
    }

    /// Delay `/validate-session` responses by `delay`.
    pub fn set_session_delay(&self, delay: std::time::Duration) {
        self.state
            .session_delay_ms
            .store(delay.as_millis().try_into().unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    /// Request counters, for asserting which channels were consulted.
    #[must_use]
    pub fn hits(&self) -> &Hits {
        &self.state.hits
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.hits.login.fetch_add(1, Ordering::SeqCst);

    let username = body.get("username").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);

    if username == Some(state.username.as_str()) && password == Some(TEST_PASSWORD) {
        // A real login establishes both channels.
        state.session_valid.store(true, Ordering::SeqCst);
        state.token_valid.store(true, Ordering::SeqCst);
        (
            [(header::SET_COOKIE, "session=fake-session; Path=/")],
            Json(json!({
                "message": "Login successful",
                "user": state.user_json(),
                "token": TEST_TOKEN,
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid username or password"})),
        )
            .into_response()
    }
}

async fn register(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.hits.register.fetch_add(1, Ordering::SeqCst);

    if body.get("username").and_then(Value::as_str) == Some(state.username.as_str()) {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Username already exists"})),
        )
            .into_response()
    } else {
        (
            StatusCode::CREATED,
            Json(json!({"message": "User registered successfully"})),
        )
            .into_response()
    }
}

async fn validate_jwt(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Json<Value> {
    state.hits.validate_jwt.fetch_add(1, Ordering::SeqCst);

    let token_ok = bearer_token(&headers) == Some(TEST_TOKEN)
        && state.token_valid.load(Ordering::SeqCst);
    if token_ok {
        Json(json!({"valid": true, "user": state.user_json()}))
    } else {
        Json(json!({"valid": false, "error": "Token is invalid or expired"}))
    }
}

async fn validate_session(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.hits.validate_session.fetch_add(1, Ordering::SeqCst);
    state.session_delay().await;

    if state.session_valid.load(Ordering::SeqCst) {
        Json(json!({"valid": true, "user": state.user_json()}))
    } else {
        Json(json!({"valid": false, "error": "Not authenticated"}))
    }
}

async fn check_auth(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.hits.check_auth.fetch_add(1, Ordering::SeqCst);

    if state.legacy_valid.load(Ordering::SeqCst) {
        Json(json!({"authenticated": true, "user": state.user_json()}))
    } else {
        Json(json!({"authenticated": false}))
    }
}

async fn refresh_session(State(state): State<Arc<BackendState>>) -> Response {
    state.hits.refresh_session.fetch_add(1, Ordering::SeqCst);

    if state.session_valid.load(Ordering::SeqCst) {
        Json(json!({"message": "Session refreshed successfully"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Session refresh failed"})),
        )
            .into_response()
    }
}

async fn logout(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.hits.logout.fetch_add(1, Ordering::SeqCst);
    state.session_valid.store(false, Ordering::SeqCst);
    state.token_valid.store(false, Ordering::SeqCst);
    Json(json!({"message": "Logout successful"}))
}

fn profile_json(state: &BackendState) -> Value {
    json!({
        "id": 1,
        "username": state.username,
        "email": format!("{}@example.com", state.username),
        "created_at": "2025-01-15T08:00:00Z",
        "last_login": "2025-06-01T12:00:00Z",
        "predictions_made": 12,
        "fake_detected": 5,
        "real_detected": 7,
    })
}

async fn profile_jwt(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let token_ok = bearer_token(&headers) == Some(TEST_TOKEN)
        && state.token_valid.load(Ordering::SeqCst);
    if token_ok {
        Json(profile_json(&state)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Token is invalid or expired"})),
        )
            .into_response()
    }
}

async fn profile(State(state): State<Arc<BackendState>>) -> Response {
    if state.session_valid.load(Ordering::SeqCst) {
        Json(profile_json(&state)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Session validation failed"})),
        )
            .into_response()
    }
}

async fn user_stats(State(state): State<Arc<BackendState>>) -> Response {
    if state.session_valid.load(Ordering::SeqCst) {
        Json(json!({
            "total_predictions": 12,
            "fake_detected": 5,
            "real_detected": 7,
            "fake_percentage": 41.7,
            "real_percentage": 58.3,
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authentication required"})),
        )
            .into_response()
    }
}
