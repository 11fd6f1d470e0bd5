//! Error taxonomy for ticket fetch and refresh operations.

use thiserror::Error;

/// Error type for ticket operations.
///
/// Cloneable so that a single refresh outcome can be fanned out to every
/// caller waiting on the same in-flight fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketError {
    /// Network or decoding failure while talking to the issuer.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The issuer answered with a non-OK application status.
    #[error("issuer rejected the request (code {code}): {message}")]
    Issuer { code: i64, message: String },

    /// The reported lifetime is too short to cache safely.
    #[error("expires_in too small: {0}")]
    ExpiresInTooSmall(i64),

    /// The reported lifetime exceeds one year.
    #[error("expires_in too large: {0}")]
    ExpiresInTooLarge(i64),

    /// The refresh coordinator task is no longer running.
    #[error("refresh coordinator is gone")]
    CoordinatorGone,
}

impl TicketError {
    /// Build a transport error from anything displayable.
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}
