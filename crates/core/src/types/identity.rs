//! The authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::email::Email;
use crate::types::id::UserId;

/// The authenticated principal as reported by the server.
///
/// Immutable except by replacement: a fresh fetch overwrites the identity
/// wholesale, there are no partial field updates.
///
/// The validation endpoints return only `id`, `username`, and `email`;
/// login and profile responses additionally carry the account timestamps,
/// so those are optional here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user ID.
    pub id: UserId,
    /// The user's login name.
    pub username: String,
    /// The user's email address.
    pub email: Email,
    /// When the account was created, if the server reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the user last logged in, if the server reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_lean_payload() {
        // Shape returned by the validation endpoints.
        let identity: Identity = serde_json::from_str(
            r#"{"id": 1, "username": "alice", "email": "alice@example.com"}"#,
        )
        .unwrap();

        assert_eq!(identity.id, UserId::new(1));
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email.as_str(), "alice@example.com");
        assert!(identity.created_at.is_none());
        assert!(identity.last_login.is_none());
    }

    #[test]
    fn test_deserialize_full_payload() {
        let identity: Identity = serde_json::from_str(
            r#"{
                "id": 2,
                "username": "bob",
                "email": "bob@example.com",
                "created_at": "2025-04-01T10:00:00Z",
                "last_login": "2025-05-01T09:30:00Z"
            }"#,
        )
        .unwrap();

        assert!(identity.created_at.is_some());
        assert!(identity.last_login.is_some());
    }

    #[test]
    fn test_serialize_skips_absent_timestamps() {
        let identity: Identity = serde_json::from_str(
            r#"{"id": 3, "username": "carol", "email": "carol@example.com"}"#,
        )
        .unwrap();

        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("created_at"));
        assert!(!json.contains("last_login"));
    }
}
