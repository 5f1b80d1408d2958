//! Error types for the transport crate.
//!
//! A `TransportError` means no usable response came back. A response with a
//! non-success status is not an error at this layer; the caller inspects
//! [`Response::status`](crate::Response) and decides.

use std::fmt;

/// Errors from sending a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection to the cluster failed or was reset.
    ConnectionFailed { reason: String },
    /// No response within the configured request timeout.
    Timeout,
    /// The request could not be built (bad URL, bad header value).
    InvalidRequest { reason: String },
    /// The HTTP client could not be constructed.
    ClientSetup { reason: String },
}

impl TransportError {
    /// Returns true if sending the same request again may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::Timeout => write!(f, "request timed out"),
            Self::InvalidRequest { reason } => {
                write!(f, "invalid request: {reason}")
            }
            Self::ClientSetup { reason } => {
                write!(f, "http client setup failed: {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}
