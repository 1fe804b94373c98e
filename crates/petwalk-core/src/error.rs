// ── Core error types ──
//
// The public error taxonomy of the petWALK facade. Transport errors from
// `petwalk-api` and model construction errors are folded into these eight
// kinds; nothing raw escapes.

use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    /// Local device or cloud endpoint could not be reached.
    #[error("Cannot connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    /// Endpoint answered with an unexpected status code.
    #[error("Incorrect status code {status} received from {url}")]
    InvalidResponseStatus { url: String, status: u16 },

    // ── Response shape ───────────────────────────────────────────────
    /// A response lacked the field or index needed to extract a result.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// A field held a value outside the known vocabulary.
    #[error("Unknown response value {value} for {field}")]
    InvalidResponseValue { field: String, value: String },

    /// A state operation was requested on a field with no value mapping.
    #[error("No state mapping for field '{field}'")]
    UnknownState { field: String },

    // ── Cloud authentication ─────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid session tokens: {message}")]
    InvalidTokens { message: String },

    // ── Model construction ───────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ModelError),
}

impl CoreError {
    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::InvalidTokens { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<petwalk_api::Error> for CoreError {
    fn from(err: petwalk_api::Error) -> Self {
        use petwalk_api::Error as Api;

        match err {
            Api::Connection { url, reason } => Self::Connection { url, reason },
            Api::Timeout { url, timeout } => Self::Connection {
                url,
                reason: format!("timed out after {timeout:?}"),
            },
            Api::WebSocket(reason) => Self::Connection {
                url: String::new(),
                reason: format!("command socket failed: {reason}"),
            },
            Api::HttpClient(reason) => Self::Connection {
                url: String::new(),
                reason,
            },
            Api::InvalidUrl(e) => Self::Connection {
                url: String::new(),
                reason: format!("invalid URL: {e}"),
            },
            Api::InvalidResponseStatus { url, status } => {
                Self::InvalidResponseStatus { url, status }
            }
            Api::InvalidResponseValue { field, value } => {
                Self::InvalidResponseValue { field, value }
            }
            Api::UnknownState { field } => Self::UnknownState { field },
            Api::Authentication { message } => Self::Authentication { message },
            Api::InvalidTokens { message } => Self::InvalidTokens { message },
            Api::Deserialization { message, body: _ } => Self::InvalidResponse { message },
        }
    }
}
