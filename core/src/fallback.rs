//! Regular-then-low-data fallback.
//!
//! # Design
//! The flow is an explicit state machine. [`AdaptiveState::advance`] is the
//! single transition rule: only a `ReachabilityConstrained` outcome of the
//! regular attempt leads to the low-data attempt, and the low-data outcome is
//! always terminal. At most two round trips happen per call.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::client::{decode, validate_response, NetClient};
use crate::error::NetClientError;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest};

/// The two targets of one adaptive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTargets {
    pub regular: Url,
    pub low_data: Url,
}

impl FallbackTargets {
    pub fn new(regular: Url, low_data: Url) -> Self {
        Self { regular, low_data }
    }

    /// Request for the attempt `state` represents, if it is not terminal.
    ///
    /// The regular attempt forbids constrained access; the low-data attempt
    /// does not.
    fn request_for(&self, state: &AdaptiveState) -> Option<HttpRequest> {
        let headers = HttpHeaders::new();
        match state {
            AdaptiveState::TryingRegular => Some(
                HttpRequest::build(HttpMethod::Get, &self.regular, &headers, None)
                    .without_constrained_access(),
            ),
            AdaptiveState::TryingLowData => Some(HttpRequest::build(
                HttpMethod::Get,
                &self.low_data,
                &headers,
                None,
            )),
            AdaptiveState::Succeeded(_) | AdaptiveState::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdaptiveState {
    TryingRegular,
    TryingLowData,
    Succeeded(Bytes),
    Failed(NetClientError),
}

impl AdaptiveState {
    /// Apply the validated outcome of the current attempt.
    pub fn advance(self, outcome: Result<Bytes, NetClientError>) -> Self {
        match (self, outcome) {
            (AdaptiveState::TryingRegular, Err(NetClientError::ReachabilityConstrained)) => {
                AdaptiveState::TryingLowData
            }
            (AdaptiveState::TryingRegular | AdaptiveState::TryingLowData, Ok(bytes)) => {
                AdaptiveState::Succeeded(bytes)
            }
            (AdaptiveState::TryingRegular | AdaptiveState::TryingLowData, Err(err)) => {
                AdaptiveState::Failed(err)
            }
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AdaptiveState::Succeeded(_) | AdaptiveState::Failed(_))
    }
}

impl NetClient {
    /// GET `regular_url` without constrained access; if that is refused for
    /// being on a constrained path, GET `low_data_url` once instead.
    pub async fn adaptive_send(
        &self,
        regular_url: &Url,
        low_data_url: &Url,
    ) -> Result<Bytes, NetClientError> {
        let targets = FallbackTargets::new(regular_url.clone(), low_data_url.clone());
        self.adaptive_send_to(&targets).await
    }

    /// [`adaptive_send`](Self::adaptive_send) followed by JSON decoding.
    pub async fn adaptive_send_decoded<R: DeserializeOwned>(
        &self,
        regular_url: &Url,
        low_data_url: &Url,
    ) -> Result<R, NetClientError> {
        let bytes = self.adaptive_send(regular_url, low_data_url).await?;
        decode(&bytes)
    }

    pub async fn adaptive_send_to(
        &self,
        targets: &FallbackTargets,
    ) -> Result<Bytes, NetClientError> {
        let mut state = AdaptiveState::TryingRegular;
        loop {
            let Some(request) = targets.request_for(&state) else {
                break;
            };
            if matches!(state, AdaptiveState::TryingLowData) {
                if self.is_cancelled() {
                    state = AdaptiveState::Failed(NetClientError::Cancelled);
                    continue;
                }
                info!(
                    regular = %targets.regular,
                    low_data = %targets.low_data,
                    "regular endpoint constrained, falling back to low-data endpoint"
                );
            }
            let outcome = self.attempt(request).await;
            state = state.advance(outcome);
        }

        match state {
            AdaptiveState::Succeeded(bytes) => Ok(bytes),
            AdaptiveState::Failed(err) => {
                debug!(kind = err.kind().as_str(), "adaptive send failed");
                Err(err)
            }
            // request_for returns None only for terminal states.
            AdaptiveState::TryingRegular | AdaptiveState::TryingLowData => {
                Err(NetClientError::Unknown {
                    message: "adaptive send stopped in a non-terminal state".to_string(),
                })
            }
        }
    }

    async fn attempt(&self, request: HttpRequest) -> Result<Bytes, NetClientError> {
        let response = self.perform(request).await?;
        validate_response(&response.metadata)?;
        Ok(response.body)
    }
}
