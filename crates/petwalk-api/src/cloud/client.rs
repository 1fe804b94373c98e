// Cloud API client
//
// Authenticated GET requests against the vendor's cloud API. Authentication
// is lazy: the first request logs in through the identity provider, later
// requests reuse the session until its access token expires.

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

use super::identity::{CognitoIdentityProvider, IdentityProvider};
use super::session::Session;
use crate::error::Error;
use crate::transport::{HttpHandle, SessionScope, TransportConfig};

/// Sent as `Client-Version` unless overridden.
pub const DEFAULT_CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeline window in days.
pub const DEFAULT_TIMELINE_INTERVAL_DAYS: u32 = 1;

const USER_ACCESS: &str = "useraccess";
const CLIENT_VERSION: &str = "client-version";

/// Client for the cloud API.
///
/// Session transitions (login, renewal, discard) are serialized per client
/// by an async mutex, so concurrent requests never authenticate twice.
#[derive(Debug)]
pub struct CloudClient<P = CognitoIdentityProvider> {
    base_url: Url,
    username: String,
    password: SecretString,
    client_version: String,
    provider: P,
    http: HttpHandle,
    session: Mutex<Option<Session>>,
}

impl<P: IdentityProvider> CloudClient<P> {
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        provider: P,
        transport: TransportConfig,
    ) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            username: username.into(),
            password,
            client_version: DEFAULT_CLIENT_VERSION.to_owned(),
            provider,
            http: HttpHandle::new(transport),
            session: Mutex::new(None),
        }
    }

    /// Override the `Client-Version` header value.
    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn scope(&self) -> SessionScope<'_> {
        SessionScope::new(&self.http)
    }

    pub fn close(&self) {
        self.http.release();
    }

    pub fn is_open(&self) -> bool {
        self.http.is_open()
    }

    /// Whether a session is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// `GET update_info`
    pub async fn get_update_info(&self) -> Result<Value, Error> {
        self.get("update_info").await
    }

    /// `GET notifications/settings`
    pub async fn get_notification_settings(&self) -> Result<Value, Error> {
        self.get("notifications/settings").await
    }

    /// `GET door_events?deviceID={door_id}&intervalDays={interval_days}`
    pub async fn get_timeline(&self, door_id: i64, interval_days: u32) -> Result<Value, Error> {
        self.get(&format!(
            "door_events?deviceID={door_id}&intervalDays={interval_days}"
        ))
        .await
    }

    /// Authenticated GET of `path` relative to the base URL. Expects 200.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        let url = self.base_url.join(path)?;
        info!(%url, "calling cloud API");

        let call = self.http.call();
        call.complete(self.get_inner(&url).await)
    }

    async fn get_inner(&self, url: &Url) -> Result<Value, Error> {
        let headers = self.headers().await?;
        let timeout = self.http.timeout();

        let resp = self
            .http
            .acquire()?
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| Error::transport(url, timeout, &e))?;

        let status = resp.status().as_u16();
        if status != 200 {
            error!(%url, status, "incorrect status code received");
            return Err(Error::InvalidResponseStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::transport(url, timeout, &e))?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, &body))
    }

    /// Build request headers, authenticating or renewing first if needed.
    async fn headers(&self) -> Result<HeaderMap, Error> {
        let mut slot = self.session.lock().await;

        let session = if let Some(session) = slot.take() {
            session
        } else {
            info!("no cloud session, authenticating");
            self.login().await?
        };

        let session = match session.is_expired(Utc::now()) {
            Ok(false) => session,
            Ok(true) => {
                info!("cloud session expired, renewing");
                self.login().await?
            }
            Err(e) => {
                error!(error = %e, "discarding cloud session");
                return Err(e);
            }
        };

        let headers = self.header_map(&session)?;
        *slot = Some(session);
        Ok(headers)
    }

    async fn login(&self) -> Result<Session, Error> {
        match self
            .provider
            .authenticate(&self.username, &self.password)
            .await
        {
            Ok(tokens) => {
                debug!(username = %self.username, "cloud session established");
                Ok(Session::new(tokens))
            }
            Err(e) => {
                error!(error = %e, "cloud authentication failed");
                self.http.release();
                Err(e)
            }
        }
    }

    fn header_map(&self, session: &Session) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, secret_header(session.id_token())?);
        headers.insert(
            HeaderName::from_static(USER_ACCESS),
            secret_header(session.access_token())?,
        );
        headers.insert(
            HeaderName::from_static(CLIENT_VERSION),
            HeaderValue::from_str(&self.client_version).map_err(|e| Error::HttpClient(format!(
                "invalid client version header: {e}"
            )))?,
        );
        Ok(headers)
    }
}

fn secret_header(token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(token.expose_secret()).map_err(|_| Error::InvalidTokens {
            message: "token is not a valid header value".into(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_its_path_when_joined() {
        let base = with_trailing_slash(Url::parse("https://api.example.com/prod").unwrap());
        assert_eq!(
            base.join("door_events?deviceID=7&intervalDays=1")
                .unwrap()
                .as_str(),
            "https://api.example.com/prod/door_events?deviceID=7&intervalDays=1"
        );
        let root = with_trailing_slash(Url::parse("https://api.example.com").unwrap());
        assert_eq!(root.join("update_info").unwrap().path(), "/update_info");
    }
}
