use serde::{Deserialize, Serialize};

/// Failures that terminate a single proxied request. Per-frame parse
/// errors are recovered locally and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The inbound request carried no messages, so there is no final turn
    /// to forward.
    #[error("request contains no messages")]
    MissingMessage,
    /// The upstream body parsed cleanly but yielded no content at all.
    #[error("empty response from upstream")]
    EmptyUpstreamResponse,
    /// The upstream response carried no readable body stream.
    #[error("upstream response body unavailable")]
    MissingReader,
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("request serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Final, merged runtime configuration.
///
/// Merge order: CLI > ENV > defaults. The auth token is optional; when
/// unset, every request is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Shared bearer secret compared against `Authorization` headers.
    pub auth_token: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8805,
            auth_token: None,
        }
    }
}
