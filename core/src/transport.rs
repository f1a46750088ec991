//! The transport capability consumed by the pipeline.
//!
//! Production code uses [`NetworkTransport`](crate::network::NetworkTransport);
//! tests use [`StubTransport`](crate::stub::StubTransport). Either is injected
//! into a [`NetClient`](crate::client::NetClient) at construction.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, TransportResponse};

/// Performs one HTTP round trip.
///
/// Implementations must be safe to call concurrently. Dropping the returned
/// future abandons the exchange and releases whatever it holds.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: HttpRequest) -> Result<TransportResponse, TransportError>;
}
