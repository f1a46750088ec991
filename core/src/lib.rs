//! Asynchronous JSON HTTP client core with a pluggable transport.
//!
//! # Overview
//! Builds requests, dispatches them through an injected [`Transport`],
//! accepts only 200 responses, and encodes/decodes JSON with serde. An
//! adaptive path tries a regular endpoint with constrained network access
//! disabled and falls back once to a low-data endpoint when that path is
//! constrained.
//!
//! # Design
//! - `NetClient` holds only its transport and a cancellation token.
//! - The transport is a trait with two implementations: `NetworkTransport`
//!   (reqwest) for production and `StubTransport` for deterministic tests.
//! - Every call ends in exactly one value or one [`NetClientError`].
//! - No retries, caching, or streaming; one round trip per call, plus at
//!   most one fallback round trip on the adaptive path.

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod http;
pub mod network;
pub mod stub;
pub mod transport;

pub use client::{validate_response, NetClient};
pub use config::NetworkConfig;
pub use error::{ErrorKind, NetClientError, TransportError};
pub use fallback::{AdaptiveState, FallbackTargets};
pub use http::{
    default_headers, merge_headers, HttpHeaders, HttpMethod, HttpRequest, ResponseMetadata,
    TransportResponse,
};
pub use network::{NetworkPath, NetworkTransport};
pub use stub::StubTransport;
pub use transport::Transport;

pub use tokio_util::sync::CancellationToken;
pub use url::Url;
