//! Error taxonomy shared by every adapter.
//!
//! All failures a tool call can hit are folded into [`ClientError`] so the
//! dispatch layer can pattern-match on kind instead of catching broad faults.
//! Configuration errors are the only fatal variant — they abort startup
//! before any listener or upstream connection exists.

use thiserror::Error;

/// Errors returned by the HTTP and SSH client cores.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required credential/URL missing or malformed at startup. Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initial or post-401 re-authentication failed. Fails the call only.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The upstream returned a non-2xx status after the allowed retry.
    #[error("upstream error (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },

    /// Network/connection failure (DNS, TCP reset, TLS, SSH connect).
    /// Messages are redacted before construction — never embed raw secrets.
    #[error("transport error: {0}")]
    Transport(String),

    /// Caller supplied a structurally invalid parameter. Rejected before
    /// any network I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Returns `true` for failures where retrying with the same credentials
    /// cannot succeed.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}
