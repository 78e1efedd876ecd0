//! Wire types for the Veritas backend's auth endpoints.
//!
//! Field names follow the backend's JSON exactly; unknown fields are
//! ignored so the client tolerates additive server changes.

use serde::{Deserialize, Serialize};

use veritas_core::Identity;

/// Credentials for `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Payload for `POST /register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `POST /login` response.
///
/// `token` is optional on the wire; older server builds issue only the
/// cookie session.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: Identity,
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of `GET /validate-jwt` and `GET /validate-session`.
///
/// Both endpoints answer 200 with `valid: false` (plus an optional
/// `error`) rather than a non-2xx status when the credential is bad.
#[derive(Debug, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the legacy `GET /check-auth` endpoint.
#[derive(Debug, Deserialize)]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Error body carried by non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Full account profile (`GET /user/profile` / `GET /user/profile-jwt`).
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub identity: Identity,
    pub predictions_made: u64,
    pub fake_detected: u64,
    pub real_detected: u64,
}

/// Aggregate usage counters (`GET /user/stats`).
#[derive(Debug, Clone, Deserialize)]
pub struct UserStats {
    pub total_predictions: u64,
    pub fake_detected: u64,
    pub real_detected: u64,
    pub fake_percentage: f64,
    pub real_percentage: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_response_invalid_without_user() {
        let resp: ValidateResponse =
            serde_json::from_str(r#"{"valid": false, "error": "Not authenticated"}"#).unwrap();
        assert!(!resp.valid);
        assert!(resp.user.is_none());
        assert_eq!(resp.error.as_deref(), Some("Not authenticated"));
    }

    #[test]
    fn test_validate_response_valid_with_user() {
        let resp: ValidateResponse = serde_json::from_str(
            r#"{"valid": true, "user": {"id": 5, "username": "alice", "email": "a@example.com"}}"#,
        )
        .unwrap();
        assert!(resp.valid);
        assert_eq!(resp.user.unwrap().username, "alice");
    }

    #[test]
    fn test_login_response_token_optional() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"message": "Login successful",
                "user": {"id": 1, "username": "alice", "email": "a@example.com"}}"#,
        )
        .unwrap();
        assert!(resp.token.is_none());
    }

    #[test]
    fn test_profile_flattens_identity() {
        let profile: Profile = serde_json::from_str(
            r#"{
                "id": 9,
                "username": "dave",
                "email": "dave@example.com",
                "created_at": "2025-01-15T08:00:00Z",
                "last_login": "2025-02-01T12:00:00Z",
                "predictions_made": 10,
                "fake_detected": 4,
                "real_detected": 6
            }"#,
        )
        .unwrap();
        assert_eq!(profile.identity.username, "dave");
        assert_eq!(profile.predictions_made, 10);
        assert!(profile.identity.created_at.is_some());
    }

    #[test]
    fn test_check_auth_unauthenticated() {
        let resp: CheckAuthResponse =
            serde_json::from_str(r#"{"authenticated": false}"#).unwrap();
        assert!(!resp.authenticated);
        assert!(resp.user.is_none());
    }
}
