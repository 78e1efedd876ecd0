//! Veritas session client library.
//!
//! Client-side authentication for the Veritas news-verification backend.
//! The backend accepts two independent credential mechanisms - a bearer
//! token sent per request and a cookie-based server session - and either
//! can expire silently. This crate owns the problem of reconciling the two
//! into a single authoritative "is this client authenticated, and as whom"
//! view:
//!
//! - [`api`] - thin HTTP client over the backend's auth endpoints
//! - [`session`] - the session state container, persistent cache,
//!   reconciler, and validation scheduler
//! - [`config`] - environment-driven client configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use veritas_client::config::ClientConfig;
//! use veritas_client::session::Reconciler;
//!
//! let config = ClientConfig::from_env()?;
//! let reconciler = Reconciler::new(&config)?;
//! let mut updates = reconciler.subscribe();
//!
//! // Restore cached state (optimistically) and confirm with the server.
//! reconciler.initialize().await;
//!
//! // The view layer reacts to snapshots; it never reads globals.
//! let snapshot = updates.borrow_and_update().clone();
//! if snapshot.authenticated {
//!     println!("logged in");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;
