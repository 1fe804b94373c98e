// Identity provider seam for the cloud API.
//
// The cloud API authorizes requests with Cognito user-pool tokens. The
// provider is a trait so tests and alternative flows can stand in for the
// real Cognito endpoint.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

/// Tokens issued by a successful authentication.
#[derive(Clone)]
pub struct Tokens {
    pub id_token: SecretString,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokens")
            .field("id_token", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Exchanges a username and password for session tokens.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<Tokens, Error>> + Send;
}

/// Cognito user-pool authentication via `InitiateAuth`.
#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    endpoint: Url,
    client_id: String,
    transport: TransportConfig,
}

impl CognitoIdentityProvider {
    /// Build a provider for `user_pool_id` (e.g. `eu-central-1_AbCdEf`).
    ///
    /// The endpoint region is taken from the pool id prefix.
    pub fn new(
        user_pool_id: &str,
        client_id: impl Into<String>,
        transport: TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = Self::endpoint_for_pool(user_pool_id)?;
        Ok(Self::with_endpoint(endpoint, client_id, transport))
    }

    /// Build a provider against an explicit endpoint.
    pub fn with_endpoint(
        endpoint: Url,
        client_id: impl Into<String>,
        transport: TransportConfig,
    ) -> Self {
        Self {
            endpoint,
            client_id: client_id.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `eu-central-1_abc` → `https://cognito-idp.eu-central-1.amazonaws.com/`
    pub fn endpoint_for_pool(user_pool_id: &str) -> Result<Url, Error> {
        let region = match user_pool_id.split_once('_') {
            Some((region, id)) if !region.is_empty() && !id.is_empty() => region,
            _ => {
                return Err(Error::Authentication {
                    message: format!("malformed user pool id '{user_pool_id}'"),
                });
            }
        };
        Ok(Url::parse(&format!(
            "https://cognito-idp.{region}.amazonaws.com/"
        ))?)
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl IdentityProvider for CognitoIdentityProvider {
    async fn authenticate(&self, username: &str, password: &SecretString) -> Result<Tokens, Error> {
        info!(endpoint = %self.endpoint, "authenticating against identity provider");

        let body = json!({
            "AuthFlow": AUTH_FLOW,
            "ClientId": self.client_id,
            "AuthParameters": {
                "USERNAME": username,
                "PASSWORD": password.expose_secret(),
            },
        });

        let resp = self
            .transport
            .build_client()?
            .post(self.endpoint.clone())
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::transport(&self.endpoint, self.transport.timeout, &e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::transport(&self.endpoint, self.transport.timeout, &e))?;

        if !status.is_success() {
            let detail: CognitoErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = match (detail.kind, detail.message) {
                (Some(kind), Some(message)) => format!("{kind}: {message}"),
                (Some(kind), None) => kind,
                (None, Some(message)) => message,
                (None, None) => format!("identity provider returned HTTP {}", status.as_u16()),
            };
            error!(status = status.as_u16(), "{message}");
            return Err(Error::Authentication { message });
        }

        let parsed: InitiateAuthResponse =
            serde_json::from_str(&text).map_err(|e| Error::Authentication {
                message: format!("unexpected identity provider response: {e}"),
            })?;

        if let Some(challenge) = parsed.challenge_name {
            return Err(Error::Authentication {
                message: format!("unsupported authentication challenge '{challenge}'"),
            });
        }
        let Some(result) = parsed.authentication_result else {
            return Err(Error::Authentication {
                message: "identity provider returned no tokens".into(),
            });
        };

        debug!(
            has_refresh_token = result.refresh_token.is_some(),
            "identity provider issued tokens"
        );
        Ok(Tokens {
            id_token: SecretString::from(result.id_token),
            access_token: SecretString::from(result.access_token),
            refresh_token: result.refresh_token.map(SecretString::from),
        })
    }
}
