//! Deterministic [`Transport`] test double.
//!
//! # Design
//! Fixtures are configuration: build a `StubTransport` with the `with_*`
//! methods before issuing calls, then share it behind an `Arc`. `perform`
//! never suspends. Resolution order for a request:
//!
//! 1. an error registered for the request URL,
//! 2. the global canned error,
//! 3. `ReachabilityConstrained` if the simulated path is constrained and the
//!    request disallows constrained access,
//! 4. the canned metadata plus the payload registered for the URL (empty if
//!    none).
//!
//! Every request received is recorded so tests can inspect what was sent.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::TransportError;
use crate::http::{HttpRequest, ResponseMetadata, TransportResponse};
use crate::transport::Transport;

#[derive(Debug, Default)]
pub struct StubTransport {
    payloads: HashMap<Url, Bytes>,
    url_errors: HashMap<Url, TransportError>,
    response: ResponseMetadata,
    error: Option<TransportError>,
    constrained: bool,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    /// A stub answering every request with status 200 and an empty body.
    pub fn new() -> Self {
        Self {
            response: ResponseMetadata::ok(),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, url: Url, payload: impl Into<Bytes>) -> Self {
        self.payloads.insert(url, payload.into());
        self
    }

    /// Metadata returned with every successful `perform`.
    pub fn with_response(mut self, response: ResponseMetadata) -> Self {
        self.response = response;
        self
    }

    /// Fail every request with `error`.
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    /// Fail requests for `url` with `error`.
    pub fn with_url_error(mut self, url: Url, error: TransportError) -> Self {
        self.url_errors.insert(url, error);
        self
    }

    /// Simulate a path on which only constrained access is available.
    pub fn with_constrained_path(mut self) -> Self {
        self.constrained = true;
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log().clone()
    }

    /// Whether any request targeted `url`.
    pub fn was_requested(&self, url: &Url) -> bool {
        self.log().iter().any(|r| r.url() == url)
    }

    fn log(&self) -> MutexGuard<'_, Vec<HttpRequest>> {
        // A panicking test thread cannot leave the log half-written.
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn perform(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
        let url = request.url().clone();
        let restricted = !request.allows_constrained_access();
        self.log().push(request);

        if let Some(err) = self.url_errors.get(&url) {
            return Err(err.clone());
        }
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.constrained && restricted {
            return Err(TransportError::ReachabilityConstrained);
        }

        Ok(TransportResponse {
            metadata: self.response.clone(),
            body: self.payloads.get(&url).cloned().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpHeaders, HttpMethod};

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
    }

    fn get(target: &Url) -> HttpRequest {
        HttpRequest::build(HttpMethod::Get, target, &HttpHeaders::new(), None)
    }

    #[tokio::test]
    async fn returns_payload_for_registered_url() {
        let stub = StubTransport::new().with_payload(url("/get"), &b"hello"[..]);
        let resp = stub.perform(get(&url("/get"))).await.unwrap();
        assert_eq!(resp.metadata.status, Some(200));
        assert_eq!(resp.body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn unknown_url_gets_empty_body() {
        let stub = StubTransport::new().with_payload(url("/get"), &b"hello"[..]);
        let resp = stub.perform(get(&url("/other"))).await.unwrap();
        assert!(resp.body.is_empty());
    }

    #[tokio::test]
    async fn error_is_preferred_over_data() {
        let stub = StubTransport::new()
            .with_payload(url("/get"), &b"hello"[..])
            .with_error(TransportError::connectivity("refused"));
        let err = stub.perform(get(&url("/get"))).await.unwrap_err();
        assert_eq!(err, TransportError::connectivity("refused"));
    }

    #[tokio::test]
    async fn url_error_only_hits_its_url() {
        let stub = StubTransport::new()
            .with_url_error(url("/regulardata"), TransportError::ReachabilityConstrained)
            .with_payload(url("/lowdata"), &b"low"[..]);
        assert_eq!(
            stub.perform(get(&url("/regulardata"))).await.unwrap_err(),
            TransportError::ReachabilityConstrained
        );
        let low = stub.perform(get(&url("/lowdata"))).await.unwrap();
        assert_eq!(low.body, Bytes::from_static(b"low"));
    }

    #[tokio::test]
    async fn constrained_path_only_refuses_restricted_requests() {
        let stub = StubTransport::new().with_constrained_path();
        let restricted = get(&url("/regulardata")).without_constrained_access();
        assert_eq!(
            stub.perform(restricted).await.unwrap_err(),
            TransportError::ReachabilityConstrained
        );
        assert!(stub.perform(get(&url("/lowdata"))).await.is_ok());
    }

    #[tokio::test]
    async fn records_requests_in_order() {
        let stub = StubTransport::new();
        stub.perform(get(&url("/a"))).await.unwrap();
        stub.perform(get(&url("/b"))).await.unwrap();
        let seen: Vec<String> = stub
            .requests()
            .iter()
            .map(|r| r.url().path().to_string())
            .collect();
        assert_eq!(seen, vec!["/a", "/b"]);
        assert!(stub.was_requested(&url("/a")));
        assert!(!stub.was_requested(&url("/c")));
    }

    #[tokio::test]
    async fn canned_metadata_is_returned() {
        let stub = StubTransport::new().with_response(ResponseMetadata::generic());
        let resp = stub.perform(get(&url("/get"))).await.unwrap();
        assert_eq!(resp.metadata.status, None);
    }
}
