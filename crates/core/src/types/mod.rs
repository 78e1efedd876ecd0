//! Core types for the Veritas client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod identity;

pub use credential::BearerToken;
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
