//! Session state ownership and reconciliation.
//!
//! The backend exposes two credential channels that can diverge: a bearer
//! token and a cookie session. This module owns the process-wide answer to
//! "is this client authenticated, and as whom":
//!
//! - [`state`] - the state container and the snapshot published to the
//!   view layer
//! - [`store`] - the persistent cache (a mirror of the state, never a
//!   source of truth)
//! - [`reconciler`] - the reconciliation algorithm: ordered fallback over
//!   the credential channels, converging on either a confirmed identity or
//!   a fully cleared state
//! - [`scheduler`] - periodic / idle / manual triggers feeding one
//!   validation driver

pub mod reconciler;
pub mod scheduler;
pub mod state;
pub mod store;

pub use reconciler::Reconciler;
pub use scheduler::ValidationScheduler;
pub use state::{AuthSnapshot, SessionState};
pub use store::SessionStore;
