use std::fmt;

use crate::status::Status;

/// Everything a call to a `Channel` can fail with (§6's RPC surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The peer returned a non-OK status.
    Status(Status),
    /// The underlying connection closed before the call completed.
    ConnectionClosed,
    /// `Context.deadline_ns` elapsed before the call completed.
    Timeout,
    /// The caller cancelled the call.
    Cancelled,
}

impl RpcError {
    pub fn internal(message: impl Into<String>) -> Self {
        RpcError::Status(Status::new(crate::status::StatusCode::Internal, message))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Status(status) => write!(f, "{status}"),
            RpcError::ConnectionClosed => f.write_str("connection closed"),
            RpcError::Timeout => f.write_str("deadline exceeded"),
            RpcError::Cancelled => f.write_str("call cancelled"),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<protokit::DecodeError> for RpcError {
    fn from(err: protokit::DecodeError) -> Self {
        RpcError::internal(err.to_string())
    }
}
