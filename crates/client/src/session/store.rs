//! Persistent session cache.
//!
//! A single JSON document mirroring the in-memory session state. The cache
//! is write-through on every successful validation and erased on every
//! invalidation; it is never the source of truth. It has no expiry
//! awareness, which is why a restore from it must always be followed by a
//! server-side confirmation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use veritas_core::{BearerToken, Identity};

/// Errors that can occur while reading or writing the cache file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The on-disk document.
///
/// All three fields are written together; at load time, partial presence
/// is treated as "invalid, re-verify from server".
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    user: Option<Identity>,
    #[serde(default)]
    is_authenticated: Option<bool>,
    #[serde(default)]
    jwt_token: Option<BearerToken>,
}

/// A fully populated cache entry, eligible for optimistic restore.
#[derive(Debug, Clone)]
pub struct CachedSession {
    /// The identity as of the last confirmed validation.
    pub identity: Identity,
    /// The bearer token held at that time.
    pub token: BearerToken,
}

/// Persistence adapter for the session cache.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the cached session, if it is fully populated.
    ///
    /// Returns `None` when the file is missing, unreadable, undecodable,
    /// or any of the three fields is absent. All of those cases mean the
    /// same thing to the caller: nothing to restore, ask the server.
    #[must_use]
    pub fn load(&self) -> Option<CachedSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), "no session cache to restore: {err}");
                return None;
            }
        };

        let doc: CacheDocument = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "discarding undecodable session cache: {err}");
                return None;
            }
        };

        match (doc.user, doc.is_authenticated, doc.jwt_token) {
            (Some(identity), Some(true), Some(token)) => Some(CachedSession { identity, token }),
            _ => None,
        }
    }

    /// Write-through after a successful validation.
    ///
    /// Written atomically (temp file + rename) so a crash mid-write leaves
    /// either the old document or the new one, never a torn file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the filesystem write fails.
    pub fn save(&self, identity: &Identity, token: Option<&BearerToken>) -> Result<(), StoreError> {
        let doc = CacheDocument {
            user: Some(identity.clone()),
            is_authenticated: Some(true),
            jwt_token: token.cloned(),
        };

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Erase the cache. Idempotent: a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for filesystem failures other than the file
    /// not existing.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        serde_json::from_str(r#"{"id": 1, "username": "alice", "email": "alice@example.com"}"#)
            .unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let token = BearerToken::from("abc");

        store.save(&identity(), Some(&token)).unwrap();

        let cached = store.load().unwrap();
        assert_eq!(cached.identity.username, "alice");
        assert_eq!(cached.token, token);
    }

    #[test]
    fn test_save_without_token_is_not_restorable() {
        // Cookie-session auth persists no token; on restart the client
        // must re-verify with the server instead of restoring.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&identity(), None).unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            dir.path().join("session.json"),
            r#"{"is_authenticated": true, "jwt_token": "abc"}"#,
        )
        .unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_undecodable_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(dir.path().join("session.json"), "not json").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&identity(), Some(&BearerToken::from("abc"))).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&identity(), Some(&BearerToken::from("old"))).unwrap();

        let bob: Identity =
            serde_json::from_str(r#"{"id": 2, "username": "bob", "email": "bob@example.com"}"#)
                .unwrap();
        store.save(&bob, Some(&BearerToken::from("new"))).unwrap();

        let cached = store.load().unwrap();
        assert_eq!(cached.identity.username, "bob");
        assert_eq!(cached.token.as_str(), "new");
    }
}
