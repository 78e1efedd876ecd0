//! Veritas Core - Shared types library.
//!
//! This crate provides common types used across all Veritas client components:
//! - `client` - Session reconciler and HTTP API client
//! - `cli` - Command-line driver for the session client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, credentials,
//!   and the authenticated identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
