//! Production transport backed by reqwest.
//!
//! DNS, TLS, and connection pooling belong to reqwest. This module only maps
//! a [`HttpRequest`] onto a reqwest request, reads the whole body, and folds
//! every reqwest failure into a [`TransportError`].
//!
//! reqwest has no notion of a metered or low-data link, so the embedding
//! application reports it through [`NetworkPath`]. Requests that disallow
//! constrained access fail fast with `ReachabilityConstrained` while the
//! path is marked constrained.

use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::config::NetworkConfig;
use crate::error::TransportError;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, ResponseMetadata, TransportResponse};
use crate::transport::Transport;

/// Shared indicator of whether the current network path is constrained.
///
/// Clones share state; flip it from whatever observes the OS network path.
#[derive(Debug, Clone, Default)]
pub struct NetworkPath {
    constrained: Arc<AtomicBool>,
}

impl NetworkPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_constrained(&self, constrained: bool) {
        self.constrained.store(constrained, Ordering::SeqCst);
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained.load(Ordering::SeqCst)
    }
}

/// [`Transport`] that performs real HTTP round trips.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    client: Client,
    path: NetworkPath,
}

impl NetworkTransport {
    /// Create a transport with [`NetworkConfig::default`].
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&NetworkConfig::default())
    }

    pub fn with_config(config: &NetworkConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::InvalidRequest {
                message: format!("failed to create HTTP client: {}", describe(&e)),
            })?;

        Ok(Self {
            client,
            path: NetworkPath::new(),
        })
    }

    /// Share an existing path indicator instead of the transport's own.
    pub fn with_network_path(mut self, path: NetworkPath) -> Self {
        self.path = path;
        self
    }

    pub fn network_path(&self) -> &NetworkPath {
        &self.path
    }
}

#[async_trait]
impl Transport for NetworkTransport {
    async fn perform(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
        if !request.allows_constrained_access() && self.path.is_constrained() {
            debug!(url = %request.url(), "constrained path, refusing request");
            return Err(TransportError::ReachabilityConstrained);
        }

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method()), request.url().clone());
        for (key, value) in request.headers() {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&e, &request))?;

        let status = response.status().as_u16();
        let headers: HttpHeaders = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&e, &request))?;

        Ok(TransportResponse {
            metadata: ResponseMetadata {
                status: Some(status),
                headers,
            },
            body,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
    }
}

/// Fold a reqwest failure into a transport error.
fn classify(err: &reqwest::Error, request: &HttpRequest) -> TransportError {
    if err.is_builder() {
        return TransportError::InvalidRequest {
            message: describe(err),
        };
    }
    TransportError::Connectivity {
        message: format!("{} {} failed", request.method(), request.url()),
        cause: Some(describe(err)),
    }
}

/// Render an error and its source chain on one line.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}
