use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::identity::Tokens;
use crate::error::Error;

/// Tokens are treated as expired this long before their `exp` claim.
const EXPIRY_LEEWAY: TimeDelta = TimeDelta::seconds(30);

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// An authenticated cloud session. Lives only in memory.
#[derive(Debug, Clone)]
pub struct Session {
    tokens: Tokens,
}

impl Session {
    pub fn new(tokens: Tokens) -> Self {
        Self { tokens }
    }

    pub fn id_token(&self) -> &SecretString {
        &self.tokens.id_token
    }

    pub fn access_token(&self) -> &SecretString {
        &self.tokens.access_token
    }

    /// Expiry decoded from the access token's `exp` claim.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, Error> {
        let token = self.tokens.access_token.expose_secret();
        let payload = token
            .split('.')
            .nth(1)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("access token is not a JWT"))?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| invalid(&format!("access token payload is not base64: {e}")))?;
        let claims: Claims = serde_json::from_slice(&raw)
            .map_err(|e| invalid(&format!("access token has no usable exp claim: {e}")))?;

        DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| invalid("access token exp claim is out of range"))
    }

    /// Whether the session must be renewed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> Result<bool, Error> {
        let renew_at = self
            .expires_at()?
            .checked_sub_signed(EXPIRY_LEEWAY)
            .ok_or_else(|| invalid("access token exp claim is out of range"))?;
        Ok(renew_at <= now)
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidTokens {
        message: message.to_owned(),
    }
}
