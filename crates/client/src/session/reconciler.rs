//! The session reconciler.
//!
//! Derives one authoritative authentication state from two independent,
//! possibly-divergent credential channels (bearer token, cookie session),
//! despite server-side state that can expire without any client-side
//! signal. Every failure mode resolves deterministically into either a
//! fallback attempt or a cleared state - authentication ambiguity never
//! reaches the view layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use veritas_core::{BearerToken, Email, Identity};

use crate::api::{ApiClient, Profile, UserStats};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::state::{AuthSnapshot, SessionState};
use crate::session::store::SessionStore;

/// One credential channel the reconciler can ask the server about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// `GET /validate-jwt` with the held bearer token.
    BearerToken,
    /// `GET /validate-session` via the ambient cookie.
    SessionCookie,
    /// Legacy `GET /check-auth`, kept for the older session mechanism.
    LegacyCheck,
}

/// Validation strategies in fallback order, short-circuiting on the first
/// success. Adding or removing a fallback is a data change here, not a
/// control-flow change.
const VALIDATION_ORDER: [Strategy; 3] = [
    Strategy::BearerToken,
    Strategy::SessionCookie,
    Strategy::LegacyCheck,
];

/// Owns the process-wide session state and reconciles it with the server.
///
/// Cheaply cloneable; all clones share the same state, cache, and update
/// channel. The view layer obtains a receiver via [`Self::subscribe`] and
/// reacts to [`AuthSnapshot`]s - it never reads shared globals.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<ReconcilerInner>,
}

struct ReconcilerInner {
    api: ApiClient,
    store: SessionStore,
    state: Mutex<SessionState>,
    updates: watch::Sender<AuthSnapshot>,
    /// Monotonically increasing state sequence. Validation passes take an
    /// id at start and commit only while it is still current; every
    /// commit (validation, login, clear) advances the sequence, so a
    /// stale response arriving out of send order cannot overwrite newer
    /// truth, whether that truth came from another pass or from a
    /// foreground action. Commits check and advance the sequence while
    /// holding the state mutex, so check-then-write cannot interleave.
    pass_seq: AtomicU64,
}

impl Reconciler {
    /// Create a reconciler from configuration.
    ///
    /// The initial state is logged out; call [`Self::initialize`] to
    /// restore and confirm any cached session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let (updates, _) = watch::channel(AuthSnapshot::default());
        Ok(Self {
            inner: Arc::new(ReconcilerInner {
                api: ApiClient::new(config)?,
                store: SessionStore::new(config.cache_path.clone()),
                state: Mutex::new(SessionState::cleared()),
                updates,
                pass_seq: AtomicU64::new(0),
            }),
        })
    }

    /// Subscribe to state transitions.
    ///
    /// The receiver always holds the latest snapshot; a notification is
    /// sent exactly once per actual transition (re-confirming an unchanged
    /// state does not wake subscribers).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.updates.subscribe()
    }

    /// The current `(authenticated, identity)` view.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state().snapshot()
    }

    /// The API client this reconciler talks through.
    ///
    /// Exposed so embedders can make further calls (e.g. predictions) on
    /// the same cookie session.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Restore session state at process start.
    ///
    /// With a fully populated cache (identity + authenticated flag +
    /// token), the in-memory state is set optimistically so the UI does
    /// not flash "logged out" on reload, and a background validation is
    /// scheduled immediately - the cache has no expiry awareness and must
    /// never be trusted without confirmation. With anything less, a
    /// synchronous server-side check runs before state is declared.
    pub async fn initialize(&self) {
        if let Some(cached) = self.inner.store.load() {
            tracing::debug!(username = %cached.identity.username, "optimistic session restore");
            *self.state() = SessionState::authenticated(cached.identity, Some(cached.token));
            self.publish();

            let this = self.clone();
            tokio::spawn(async move {
                this.validate().await;
            });
        } else {
            self.validate().await;
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Tries each credential channel in [`VALIDATION_ORDER`], adopting the
    /// identity returned by the first that succeeds. Transport failures,
    /// rejections, and malformed payloads are treated identically: advance
    /// to the next fallback, and clear the session when all are exhausted.
    /// Nothing is retried within a single pass; the scheduler provides the
    /// retry cadence.
    ///
    /// Returns whether the client is authenticated afterwards.
    pub async fn validate(&self) -> bool {
        let pass = self.inner.pass_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.state().token().cloned();

        for strategy in VALIDATION_ORDER {
            let Some((identity, adopted_token)) = self.attempt(strategy, token.as_ref()).await
            else {
                continue;
            };

            let username = identity.username.clone();
            if !self.commit_if_latest(pass, SessionState::authenticated(identity, adopted_token)) {
                tracing::debug!(?strategy, pass, "discarding stale validation result");
                return self.state().is_authenticated();
            }
            tracing::info!(?strategy, %username, "session validated");

            // Cookie-backed successes also extend the server-side session
            // lifetime; fire-and-forget, failure is logged only.
            if strategy != Strategy::BearerToken {
                let api = self.inner.api.clone();
                tokio::spawn(async move {
                    if let Err(err) = api.refresh_session().await {
                        tracing::debug!("session refresh failed: {err}");
                    }
                });
            }

            return true;
        }

        if self.commit_if_latest(pass, SessionState::cleared()) {
            tracing::info!("all validation strategies failed, clearing session");
            false
        } else {
            tracing::debug!(pass, "discarding stale validation failure");
            self.state().is_authenticated()
        }
    }

    /// Try one strategy; `None` covers every failure mode alike.
    async fn attempt(
        &self,
        strategy: Strategy,
        token: Option<&BearerToken>,
    ) -> Option<(Identity, Option<BearerToken>)> {
        match strategy {
            Strategy::BearerToken => {
                let token = token?;
                match self.inner.api.validate_token(token).await {
                    Ok(resp) if resp.valid => {
                        resp.user.map(|identity| (identity, Some(token.clone())))
                    }
                    Ok(resp) => {
                        tracing::debug!(
                            error = resp.error.as_deref().unwrap_or("rejected"),
                            "bearer token rejected"
                        );
                        None
                    }
                    Err(err) => {
                        tracing::debug!("token validation failed: {err}");
                        None
                    }
                }
            }
            Strategy::SessionCookie => match self.inner.api.validate_session().await {
                Ok(resp) if resp.valid => resp.user.map(|identity| (identity, None)),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!("session validation failed: {err}");
                    None
                }
            },
            Strategy::LegacyCheck => match self.inner.api.check_auth().await {
                Ok(resp) if resp.authenticated => resp.user.map(|identity| (identity, None)),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!("legacy auth check failed: {err}");
                    None
                }
            },
        }
    }

    /// Reset to the empty state and erase the persistent cache.
    ///
    /// Idempotent: clearing an already-cleared session has no observable
    /// effect (subscribers are not re-notified). Any validation pass in
    /// flight becomes stale; its result will be discarded.
    pub fn clear(&self) {
        self.commit(SessionState::cleared());
    }

    /// Log out: best-effort server notification, then the local effect of
    /// [`Self::clear`] unconditionally.
    ///
    /// The view layer observes the cleared snapshot and navigates to the
    /// unauthenticated entry point.
    pub async fn logout(&self) {
        if let Err(err) = self.inner.api.logout().await {
            tracing::warn!("server logout failed (continuing locally): {err}");
        }
        self.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Foreground Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Log in with username and password.
    ///
    /// A successful login is itself a server confirmation: the returned
    /// identity (and token, if issued) are adopted and persisted, and any
    /// validation pass already in flight is invalidated so it cannot wipe
    /// the fresh state.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message on bad
    /// credentials; state is left untouched on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ApiError> {
        let resp = self.inner.api.login(username, password).await?;
        let token = resp.token.map(BearerToken::new);
        self.commit(SessionState::authenticated(resp.user.clone(), token));
        Ok(resp.user)
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the email is structurally invalid
    /// (checked locally before the request) or the server refuses the
    /// registration.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::rejected(e.to_string()))?;
        self.inner.api.register(username, email.as_str(), password).await
    }

    /// Fetch the full account profile.
    ///
    /// Token-first with session fallback: tries the bearer endpoint when a
    /// token is held, then falls back to validating the cookie session and
    /// using the session endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when neither channel is authenticated.
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        if let Some(token) = self.state().token().cloned() {
            match self.inner.api.profile_via_token(&token).await {
                Ok(profile) => return Ok(profile),
                Err(err) => tracing::debug!("token profile fetch failed, trying session: {err}"),
            }
        }

        match self.inner.api.validate_session().await {
            Ok(resp) if resp.valid => self.inner.api.profile_via_session().await,
            Ok(_) => Err(ApiError::rejected("Session expired")),
            Err(err) => Err(err),
        }
    }

    /// Fetch aggregate usage counters for the logged-in account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the session is not authenticated.
    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        self.inner.api.user_stats().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit a state transition unconditionally (foreground actions):
    /// advance the sequence so in-flight validation passes become stale,
    /// replace state wholesale, mirror to the cache, notify subscribers.
    fn commit(&self, next: SessionState) {
        let mut state = self.state();
        self.inner.pass_seq.fetch_add(1, Ordering::SeqCst);
        self.write_through(&next);
        *state = next;
        drop(state);
        self.publish();
    }

    /// Commit a validation pass's result, unless a newer pass or a
    /// foreground action has committed since `pass` was issued. The check
    /// and the write share one critical section.
    fn commit_if_latest(&self, pass: u64, next: SessionState) -> bool {
        let mut state = self.state();
        if self.inner.pass_seq.load(Ordering::SeqCst) != pass {
            return false;
        }
        self.write_through(&next);
        *state = next;
        drop(state);
        self.publish();
        true
    }

    /// Mirror a state transition to the persistent cache; cache failures
    /// are logged, never fatal.
    fn write_through(&self, next: &SessionState) {
        let result = match next.identity() {
            Some(identity) => self.inner.store.save(identity, next.token()),
            None => self.inner.store.clear(),
        };
        if let Err(err) = result {
            tracing::warn!("failed to update session cache: {err}");
        }
    }

    fn publish(&self) {
        let snapshot = self.state().snapshot();
        self.inner.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Short, never held across an await.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unreachable_reconciler(dir: &tempfile::TempDir) -> Reconciler {
        // TCP port 9 (discard) refuses connections on any sane test host,
        // so every strategy fails at the transport level immediately.
        let mut config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        config.cache_path = dir.path().join("session.json");
        Reconciler::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_validate_with_unreachable_server_converges_to_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = unreachable_reconciler(&dir);

        assert!(!reconciler.validate().await);

        let snapshot = reconciler.snapshot();
        assert!(!snapshot.authenticated);
        assert!(snapshot.identity.is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_does_not_renotify() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = unreachable_reconciler(&dir);
        let mut updates = reconciler.subscribe();
        let _ = updates.borrow_and_update();

        reconciler.clear();
        reconciler.clear();

        // The state was already cleared, so neither call is a transition.
        assert!(!updates.has_changed().unwrap());
        assert_eq!(reconciler.snapshot(), AuthSnapshot::default());
    }

    #[tokio::test]
    async fn test_initialize_without_cache_checks_server() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = unreachable_reconciler(&dir);

        // No cache and an unreachable server: initialize must complete
        // and leave the client logged out, not hang or error.
        reconciler.initialize().await;

        assert!(!reconciler.snapshot().authenticated);
    }

    #[test]
    fn test_validation_order_tries_token_first_and_legacy_last() {
        assert_eq!(VALIDATION_ORDER.first(), Some(&Strategy::BearerToken));
        assert_eq!(VALIDATION_ORDER.last(), Some(&Strategy::LegacyCheck));
    }
}
