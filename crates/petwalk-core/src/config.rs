// ── Runtime connection configuration ──
//
// Describes how to reach one door and its cloud account. Carries credentials
// and timeouts but never touches disk; the CLI builds a `ClientConfig` and
// hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use petwalk_api::cloud::DEFAULT_CLIENT_VERSION;
use petwalk_api::command::DEFAULT_WS_PORT;
use petwalk_api::local::DEFAULT_API_PORT;
use petwalk_api::transport::{DEFAULT_CLOUD_TIMEOUT, DEFAULT_LOCAL_TIMEOUT};

/// Cloud account and identity-provider settings.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Base URL of the cloud API.
    pub url: Url,
    /// Cognito user pool, e.g. `eu-central-1_AbCdEf`.
    pub user_pool_id: String,
    pub client_id: String,
    /// Replaces the identity endpoint derived from `user_pool_id`.
    pub identity_url: Option<Url>,
    pub username: String,
    pub password: SecretString,
    /// Sent as the `Client-Version` header.
    pub client_version: String,
    pub timeout: Duration,
}

impl CloudConfig {
    pub fn new(
        url: Url,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            url,
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            identity_url: None,
            username: username.into(),
            password,
            client_version: DEFAULT_CLIENT_VERSION.to_owned(),
            timeout: DEFAULT_CLOUD_TIMEOUT,
        }
    }
}

/// Everything needed to build a [`PetWalk`](crate::PetWalk) facade.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname or IP of the door on the local network.
    pub host: String,
    pub api_port: u16,
    pub ws_port: u16,
    /// Timeout for local HTTP calls and command socket exchanges.
    pub local_timeout: Duration,
    pub cloud: CloudConfig,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, cloud: CloudConfig) -> Self {
        Self {
            host: host.into(),
            api_port: DEFAULT_API_PORT,
            ws_port: DEFAULT_WS_PORT,
            local_timeout: DEFAULT_LOCAL_TIMEOUT,
            cloud,
        }
    }

    pub fn with_api_port(mut self, port: u16) -> Self {
        self.api_port = port;
        self
    }

    pub fn with_ws_port(mut self, port: u16) -> Self {
        self.ws_port = port;
        self
    }

    pub fn with_local_timeout(mut self, timeout: Duration) -> Self {
        self.local_timeout = timeout;
        self
    }
}
