//! Error types for the Veritas API client.

use thiserror::Error;

/// Errors that can occur when talking to the Veritas backend.
///
/// The reconciliation loop deliberately flattens this taxonomy: transport
/// failures, credential rejections, and malformed payloads all advance to
/// the next fallback strategy (or to a cleared state). The distinction only
/// matters for foreground actions, which surface [`ApiError::Rejected`]
/// messages to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: no well-formed HTTP response arrived.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The server answered and refused the request or credential.
    #[error("{message}")]
    Rejected {
        /// The server's `{error}` message, or a generic fallback.
        message: String,
    },

    /// The response body could not be decoded as the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Generic rejection for responses that carried no `{error}` field.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Decode failures are a server-shape problem, not a network problem.
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}
