//! Credential types.
//!
//! The backend issues two kinds of credentials: an opaque signed bearer
//! token presented via the `Authorization` header, and a cookie-based
//! session handle that the HTTP transport carries automatically. Only the
//! bearer token needs a value type on the client; the session cookie never
//! leaves the cookie store.

use serde::{Deserialize, Serialize};

/// An opaque signed bearer token.
///
/// The token contents are server-defined and never inspected client-side.
/// `Debug` output is redacted so tokens cannot leak into logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Create a bearer token from its raw string form.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Get the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token and return the raw string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

impl From<String> for BearerToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for BearerToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = BearerToken::from("eyJhbGciOiJIUzI1NiJ9.secret");
        let debug_output = format!("{token:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("secret"));
    }

    #[test]
    fn test_serde_transparent() {
        let token = BearerToken::from("abc");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"abc\"");

        let parsed: BearerToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_as_str() {
        let token = BearerToken::new("abc".to_owned());
        assert_eq!(token.as_str(), "abc");
        assert_eq!(token.into_inner(), "abc");
    }
}
