//! Error types for telefilmes-client.

use std::fmt;

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An error object returned by the remote service for a specific request.
///
/// Recoverable and per-request: the correlator resolves the matching
/// awaitable with it and nothing else is affected — unless the request was an
/// authentication step, in which case the facade also folds it into
/// [`crate::AuthPhase::Failed`].
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    /// Numeric error code as reported by the service.
    pub code:    i32,
    /// Human-readable error message.
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

// ─── ClientError ──────────────────────────────────────────────────────────────

/// The error type surfaced by every [`crate::Client`] operation that can fail.
#[derive(Debug)]
pub enum ClientError {
    /// The remote service rejected the request.
    Rpc(RpcError),
    /// Input failed local validation; no request reached the adapter.
    InvalidInput(String),
    /// The request was abandoned (client shut down before the response).
    Dropped,
    /// The client has been shut down; no further operations can succeed.
    Closed,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(e)          => write!(f, "{e}"),
            Self::InvalidInput(s) => write!(f, "invalid input: {s}"),
            Self::Dropped         => write!(f, "request dropped"),
            Self::Closed          => write!(f, "client is shut down"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self { Self::Rpc(e) }
}

impl ClientError {
    /// The message to show the user for this failure.
    pub fn reason(&self) -> String {
        match self {
            Self::Rpc(e)          => e.message.clone(),
            Self::InvalidInput(s) => s.clone(),
            Self::Dropped         => "request dropped".into(),
            Self::Closed          => "client is shut down".into(),
        }
    }
}
