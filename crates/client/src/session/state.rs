//! The session state container.

use veritas_core::{BearerToken, Identity};

/// Process-wide authentication state.
///
/// Fields are private so the invariant `authenticated ⇒ identity present`
/// can only be established through the two constructors. State is replaced
/// wholesale on every transition; there are no partial field updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    authenticated: bool,
    token: Option<BearerToken>,
}

impl SessionState {
    /// The empty, logged-out state.
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            identity: None,
            authenticated: false,
            token: None,
        }
    }

    /// An authenticated state with a server-confirmed identity.
    ///
    /// `token` is `None` when authentication came through the cookie
    /// session; a token is only carried while the bearer channel is the
    /// one the server last accepted.
    #[must_use]
    pub const fn authenticated(identity: Identity, token: Option<BearerToken>) -> Self {
        Self {
            identity: Some(identity),
            authenticated: true,
            token,
        }
    }

    /// Whether the client is currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The authenticated identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The held bearer token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// The `(authenticated, identity)` view published to the view layer.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            authenticated: self.authenticated,
            identity: self.identity.clone(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::cleared()
    }
}

/// The view layer's window into session state.
///
/// Published through a watch channel after every state transition. The
/// token is deliberately absent - nothing outside the reconciler needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSnapshot {
    /// Whether the client is authenticated.
    pub authenticated: bool,
    /// The confirmed identity; present whenever `authenticated` is true.
    pub identity: Option<Identity>,
}
