//! Programmatic configuration for the network transport.

use std::time::Duration;

/// Settings applied when building a [`NetworkTransport`](crate::network::NetworkTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Upper bound on a whole round trip, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &'static str = concat!("netclient/", env!("CARGO_PKG_VERSION"));
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: Self::REQUEST_TIMEOUT,
            connect_timeout: Self::CONNECT_TIMEOUT,
            user_agent: Self::USER_AGENT.to_string(),
        }
    }
}
