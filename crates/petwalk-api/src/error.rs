use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `petwalk-api` crate.
///
/// Covers every failure mode across the three transports: the local HTTP
/// control API, the WebSocket command socket and the cloud API with its
/// identity provider. `petwalk-core` maps these into the public taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The identity provider rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session tokens could not be validated (corrupt or missing).
    #[error("Invalid session tokens: {message}")]
    InvalidTokens { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Endpoint unreachable (refused, reset, DNS failure, socket error).
    #[error("Cannot connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    /// Request exceeded the configured timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The command socket failed after the connection was established.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Response ────────────────────────────────────────────────────
    /// Endpoint answered with a status code other than the expected one.
    #[error("Incorrect status code {status} received from {url}")]
    InvalidResponseStatus { url: String, status: u16 },

    /// A field held a value outside the known vocabulary.
    #[error("Unknown response value {value} for {field}")]
    InvalidResponseValue { field: String, value: String },

    /// A state-class operation was requested on a field without a value mapping.
    #[error("No state mapping for field '{field}'")]
    UnknownState { field: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Classify a `reqwest` send/read failure against `url`.
    pub(crate) fn transport(url: &url::Url, timeout: Duration, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            Self::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Build a deserialization error carrying a bounded preview of the body.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }

    /// Returns `true` for errors where the endpoint was never reached.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::WebSocket(_)
        )
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::InvalidTokens { .. })
    }
}
