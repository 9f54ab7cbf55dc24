//! Network client error types.

use thiserror::Error;

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors raised by a [`Transport`](super::Transport).
#[derive(Debug, Error)]
pub enum NetError {
    /// Server answered with something other than 200 OK.
    #[error("HTTP {code} {reason} from {url}")]
    Status {
        url: String,
        code: u16,
        reason: String,
    },

    /// DNS, TLS, connect, timeout or mid-body read failure.
    #[error("network error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Body arrived but could not be decompressed or decoded as UTF-8.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The HTTP client itself could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl NetError {
    pub(crate) fn transport(url: &str, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(url: &str, reason: impl ToString) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
