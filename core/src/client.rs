//! The send pipeline: build, perform, validate, decode.
//!
//! # Design
//! `NetClient` holds only an injected transport and a cancellation token; it
//! carries no other state between calls and is cheap to clone. Every call is
//! a straight sequence of result-returning steps that short-circuits on the
//! first failure, so a call ends with exactly one value or one error.
//!
//! The transport round trip is the only suspension point. It is raced
//! against the client's cancellation token; a cancelled call drops the
//! in-flight transport future and reports `Cancelled`.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::NetClientError;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, ResponseMetadata, TransportResponse};
use crate::transport::Transport;

/// Asynchronous JSON HTTP client over a pluggable [`Transport`].
#[derive(Clone)]
pub struct NetClient {
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for NetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetClient")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl NetClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cancel: CancellationToken::new(),
        }
    }

    /// A clone of this client whose calls stop when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cancel: token,
        }
    }

    /// Send a prepared request and return the raw body of a 200 response.
    pub async fn send_request(&self, request: HttpRequest) -> Result<Bytes, NetClientError> {
        let response = self.perform(request).await?;
        validate_response(&response.metadata)?;
        Ok(response.body)
    }

    /// Send without a body and return the raw response bytes.
    pub async fn send(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HttpHeaders,
    ) -> Result<Bytes, NetClientError> {
        self.send_request(HttpRequest::build(method, url, headers, None)).await
    }

    /// Send without a body and decode the response as JSON.
    pub async fn send_decoded<R>(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HttpHeaders,
    ) -> Result<R, NetClientError>
    where
        R: DeserializeOwned,
    {
        let bytes = self.send(method, url, headers).await?;
        decode(&bytes)
    }

    /// Encode `body` as JSON, send it, and decode the response as JSON.
    pub async fn send_with_body<B, R>(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HttpHeaders,
        body: &B,
    ) -> Result<R, NetClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let encoded = encode(body)?;
        let request = HttpRequest::build(method, url, headers, Some(encoded));
        let bytes = self.send_request(request).await?;
        decode(&bytes)
    }

    pub async fn get(&self, url: &Url) -> Result<Bytes, NetClientError> {
        self.send(HttpMethod::Get, url, &HttpHeaders::new()).await
    }

    pub async fn get_with_headers(
        &self,
        url: &Url,
        headers: &HttpHeaders,
    ) -> Result<Bytes, NetClientError> {
        self.send(HttpMethod::Get, url, headers).await
    }

    pub async fn get_decoded<R: DeserializeOwned>(&self, url: &Url) -> Result<R, NetClientError> {
        self.send_decoded(HttpMethod::Get, url, &HttpHeaders::new()).await
    }

    pub async fn get_decoded_with_headers<R: DeserializeOwned>(
        &self,
        url: &Url,
        headers: &HttpHeaders,
    ) -> Result<R, NetClientError> {
        self.send_decoded(HttpMethod::Get, url, headers).await
    }

    pub async fn post<B, R>(&self, url: &Url, body: &B) -> Result<R, NetClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_with_body(HttpMethod::Post, url, &HttpHeaders::new(), body).await
    }

    pub async fn post_with_headers<B, R>(
        &self,
        url: &Url,
        headers: &HttpHeaders,
        body: &B,
    ) -> Result<R, NetClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_with_body(HttpMethod::Post, url, headers, body).await
    }

    pub async fn delete(&self, url: &Url) -> Result<Bytes, NetClientError> {
        self.send(HttpMethod::Delete, url, &HttpHeaders::new()).await
    }

    pub async fn delete_with_headers(
        &self,
        url: &Url,
        headers: &HttpHeaders,
    ) -> Result<Bytes, NetClientError> {
        self.send(HttpMethod::Delete, url, headers).await
    }

    /// One transport round trip, raced against cancellation.
    pub(crate) async fn perform(
        &self,
        request: HttpRequest,
    ) -> Result<TransportResponse, NetClientError> {
        if self.cancel.is_cancelled() {
            debug!(url = %request.url(), "call cancelled before dispatch");
            return Err(NetClientError::Cancelled);
        }

        debug!(method = %request.method(), url = %request.url(), "sending request");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("call cancelled in flight");
                Err(NetClientError::Cancelled)
            }
            result = self.transport.perform(request) => result.map_err(NetClientError::from),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Accept only metadata carrying HTTP status 200.
pub fn validate_response(metadata: &ResponseMetadata) -> Result<(), NetClientError> {
    match metadata.status {
        Some(200) => Ok(()),
        Some(status) => {
            warn!(status, "unexpected response status");
            Err(NetClientError::InvalidServerResponse)
        }
        None => {
            warn!("response carried no HTTP status");
            Err(NetClientError::InvalidServerResponse)
        }
    }
}

pub(crate) fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes, NetClientError> {
    serde_json::to_vec(body).map(Bytes::from).map_err(|e| {
        warn!(error = %e, "failed to encode request body");
        NetClientError::FailedToEncodeBody
    })
}

pub(crate) fn decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, NetClientError> {
    serde_json::from_slice(bytes).map_err(|e| {
        warn!(error = %e, "failed to decode response");
        NetClientError::from_decode(&e)
    })
}
