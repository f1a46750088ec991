//! Error types for the request pipeline.
//!
//! # Design
//! `TransportError` is what a [`Transport`](crate::transport::Transport)
//! reports. `NetClientError` is the closed set of kinds a pipeline call can
//! end with; every step maps its local failure into exactly one variant.
//! Only `ReachabilityConstrained` is ever inspected to choose an alternate
//! action (the adaptive fallback); everything else is terminal.

use thiserror::Error;

/// Failure reported by a transport before any response metadata exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request disallowed constrained network access and the only
    /// available path is constrained.
    #[error("network path is constrained and the request disallows constrained access")]
    ReachabilityConstrained,

    /// Timeout, DNS failure, refused connection, TLS failure, or a broken
    /// exchange.
    #[error("connectivity failure: {message}")]
    Connectivity {
        message: String,
        cause: Option<String>,
    },

    /// The transport could not form the request at all.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl TransportError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        TransportError::Connectivity {
            message: message.into(),
            cause: None,
        }
    }
}

/// Errors returned by [`NetClient`](crate::client::NetClient) calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetClientError {
    /// Missing HTTP status, or a status other than 200.
    #[error("invalid server response")]
    InvalidServerResponse,

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body")]
    FailedToEncodeBody,

    /// The response body could not be deserialized into the requested type.
    #[error("failed to decode response")]
    FailedToDecodeResponse,

    /// Regular-endpoint access was denied because of the network access class.
    #[error("network path is constrained")]
    ReachabilityConstrained,

    #[error("connectivity failure: {message}")]
    ConnectivityFailure {
        message: String,
        cause: Option<String>,
    },

    /// The caller cancelled the in-flight call.
    #[error("request cancelled")]
    Cancelled,

    #[error("unknown error: {message}")]
    Unknown { message: String },
}

/// Payload-free discriminant of [`NetClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidServerResponse,
    FailedToEncodeBody,
    FailedToDecodeResponse,
    ReachabilityConstrained,
    ConnectivityFailure,
    Cancelled,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidServerResponse => "invalid_server_response",
            ErrorKind::FailedToEncodeBody => "failed_to_encode_body",
            ErrorKind::FailedToDecodeResponse => "failed_to_decode_response",
            ErrorKind::ReachabilityConstrained => "reachability_constrained",
            ErrorKind::ConnectivityFailure => "connectivity_failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl NetClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetClientError::InvalidServerResponse => ErrorKind::InvalidServerResponse,
            NetClientError::FailedToEncodeBody => ErrorKind::FailedToEncodeBody,
            NetClientError::FailedToDecodeResponse => ErrorKind::FailedToDecodeResponse,
            NetClientError::ReachabilityConstrained => ErrorKind::ReachabilityConstrained,
            NetClientError::ConnectivityFailure { .. } => ErrorKind::ConnectivityFailure,
            NetClientError::Cancelled => ErrorKind::Cancelled,
            NetClientError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Classify a failure to deserialize a response body.
    pub(crate) fn from_decode(err: &serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => NetClientError::Unknown {
                message: err.to_string(),
            },
            _ => NetClientError::FailedToDecodeResponse,
        }
    }
}

impl From<TransportError> for NetClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ReachabilityConstrained => NetClientError::ReachabilityConstrained,
            TransportError::Connectivity { message, cause } => {
                NetClientError::ConnectivityFailure { message, cause }
            }
            TransportError::InvalidRequest { message } => NetClientError::Unknown { message },
        }
    }
}
