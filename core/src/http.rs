//! HTTP request and response descriptions passed between the pipeline and a
//! [`Transport`](crate::transport::Transport).
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! pipeline builds an `HttpRequest`, hands it to the transport by value, and
//! receives a `TransportResponse` back. Neither side mutates what it was
//! given, so no synchronization is needed within a single call.
//!
//! Header names keep the caller's spelling. Overriding a default header is
//! decided case-insensitively because HTTP header names are case-insensitive.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use url::Url;

/// Header mapping used for both requests and responses.
pub type HttpHeaders = HashMap<String, String>;

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Headers applied beneath every caller-supplied header mapping.
pub fn default_headers() -> HttpHeaders {
    HttpHeaders::from([
        (ACCEPT.to_string(), APPLICATION_JSON.to_string()),
        (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
    ])
}

/// Merge `overrides` on top of [`default_headers`].
///
/// A caller key replaces a default key when the two are equal ignoring ASCII
/// case; the caller's spelling is kept. Caller keys never displace each other.
pub fn merge_headers(overrides: &HttpHeaders) -> HttpHeaders {
    let mut merged: HttpHeaders = default_headers()
        .into_iter()
        .filter(|(name, _)| !overrides.keys().any(|key| key.eq_ignore_ascii_case(name)))
        .collect();
    merged.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by [`HttpRequest::build`] and consumed by a transport. Fields are
/// private so a request cannot change once built.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: HttpMethod,
    url: Url,
    headers: HttpHeaders,
    body: Option<Bytes>,
    allow_constrained_access: bool,
}

impl HttpRequest {
    /// Compose a request from its parts.
    ///
    /// `headers` are merged over [`default_headers`]. `body` must already be
    /// serialized; content length and encoding are left to the transport.
    pub fn build(
        method: HttpMethod,
        url: &Url,
        headers: &HttpHeaders,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            method,
            url: url.clone(),
            headers: merge_headers(headers),
            body,
            allow_constrained_access: true,
        }
    }

    /// Forbid the transport from using a constrained (metered, low-data)
    /// network path for this request.
    pub fn without_constrained_access(mut self) -> Self {
        self.allow_constrained_access = false;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn allows_constrained_access(&self) -> bool {
        self.allow_constrained_access
    }
}

/// Response metadata reported by a transport.
///
/// `status` is `None` when the exchange produced no HTTP-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub status: Option<u16>,
    pub headers: HttpHeaders,
}

impl ResponseMetadata {
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            headers: HttpHeaders::new(),
        }
    }

    /// Metadata without an HTTP status.
    pub fn generic() -> Self {
        Self::default()
    }
}

/// What a transport returns for a completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub metadata: ResponseMetadata,
    pub body: Bytes,
}
