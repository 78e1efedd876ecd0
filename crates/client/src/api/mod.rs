//! HTTP client for the Veritas backend's auth endpoints.
//!
//! The backend carries two credential channels side by side: a bearer token
//! presented explicitly per request, and a cookie session that the client
//! transport replays automatically. The client is therefore built with its
//! cookie store enabled - every call that reaches the backend carries the
//! ambient session cookie, and bearer-token calls add an `Authorization`
//! header on top.
//!
//! # Example
//!
//! ```rust,ignore
//! use veritas_client::api::ApiClient;
//! use veritas_client::config::ClientConfig;
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//!
//! let login = api.login("alice", "hunter22").await?;
//! let outcome = api.validate_session().await?;
//! ```

mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use veritas_core::BearerToken;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Client for the Veritas backend API.
///
/// Cheaply cloneable; all clones share one connection pool and one cookie
/// store, so a login performed through any clone benefits every clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Malformed(format!("bad endpoint path {path}: {e}")))
    }

    /// Decode a JSON body, mapping non-2xx statuses to [`ApiError::Rejected`]
    /// with the server's `{error}` message when one is present.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("{fallback} ({status})"));
            return Err(ApiError::rejected(message));
        }

        Ok(response.json::<T>().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Foreground Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Log in with username and password (`POST /login`).
    ///
    /// On success the server sets the session cookie (captured by the
    /// shared cookie store) and usually issues a bearer token as well.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message on bad
    /// credentials, `ApiError::Transport` on network failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/login")?)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        Self::decode(response, "Login failed").await
    }

    /// Register a new account (`POST /register`).
    ///
    /// Registration does not log the user in; the caller follows up with
    /// [`Self::login`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message (duplicate
    /// username, invalid email, ...) on refusal.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/register")?)
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Registration failed ({status})"));
            return Err(ApiError::rejected(message));
        }

        Ok(())
    }

    /// Notify the server of logout (`POST /logout`).
    ///
    /// Best-effort by design: callers log failures and proceed with the
    /// local logout regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the response body is ignored.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/logout")?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::rejected("Logout rejected"));
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credential Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate a bearer token (`GET /validate-jwt`).
    ///
    /// The server answers 200 with `valid: false` for a bad token, so a
    /// returned `ValidateResponse` must still be inspected.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undecodable body.
    pub async fn validate_token(&self, token: &BearerToken) -> Result<ValidateResponse, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/validate-jwt")?)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::decode(response, "Token validation failed").await
    }

    /// Validate the ambient cookie session (`GET /validate-session`).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undecodable body.
    pub async fn validate_session(&self) -> Result<ValidateResponse, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/validate-session")?)
            .send()
            .await?;

        Self::decode(response, "Session validation failed").await
    }

    /// Legacy authentication check (`GET /check-auth`).
    ///
    /// Kept for backward compatibility with the older session mechanism;
    /// tried only after both modern validation endpoints fail.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undecodable body.
    pub async fn check_auth(&self) -> Result<CheckAuthResponse, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/check-auth")?)
            .send()
            .await?;

        Self::decode(response, "Auth check failed").await
    }

    /// Extend the server-side session lifetime (`POST /refresh-session`).
    ///
    /// Fire-and-forget from the reconciler's point of view; the body is
    /// ignored either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, for logging only.
    pub async fn refresh_session(&self) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/refresh-session")?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::rejected("Session refresh rejected"));
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Account Data
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the account profile with a bearer token (`GET /user/profile-jwt`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the token is refused.
    pub async fn profile_via_token(&self, token: &BearerToken) -> Result<Profile, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/user/profile-jwt")?)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::decode(response, "Profile retrieval failed").await
    }

    /// Fetch the account profile via the cookie session (`GET /user/profile`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the session is not authenticated.
    pub async fn profile_via_session(&self) -> Result<Profile, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/user/profile")?)
            .send()
            .await?;

        Self::decode(response, "Profile retrieval failed").await
    }

    /// Fetch aggregate usage counters (`GET /user/stats`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the session is not authenticated.
    pub async fn user_stats(&self) -> Result<UserStats, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/user/stats")?)
            .send()
            .await?;

        Self::decode(response, "Stats retrieval failed").await
    }
}
