// Local control API client
//
// Two logical resource groups live on the device's HTTP API: "modes"
// (feature toggles with boolean wire values) and "states" (system power and
// door position, wire values are domain strings). This module owns the field
// table, the value vocabulary, and the GET/PUT mechanics.

use std::fmt;

use serde_json::{Map, Value, json};
use strum::{AsRefStr, EnumString};
use tracing::{debug, error, info};
use url::Url;

use crate::error::Error;
use crate::transport::{HttpHandle, SessionScope, TransportConfig};

/// Default port of the local control API.
pub const DEFAULT_API_PORT: u16 = 8080;

const STATUS_READ_OK: u16 = 200;
const STATUS_WRITE_ACCEPTED: u16 = 202;

const SYSTEM_ON: &str = "on";
const SYSTEM_OFF: &str = "off";
const DOOR_OPEN: &str = "open";
const DOOR_CLOSE: &str = "close";
const DOOR_CLOSED: &str = "closed";

// ── Field table ──────────────────────────────────────────────────────

/// Which endpoint a field is read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// `/modes` -- boolean toggles.
    Mode,
    /// `/states` -- domain strings (`on`/`off`, `open`/`close`).
    State,
}

impl FieldGroup {
    pub fn path(self) -> &'static str {
        match self {
            Self::Mode => "modes",
            Self::State => "states",
        }
    }
}

/// Every field exposed by the local control API.
///
/// `FromStr` accepts the wire name (`"brightnessSensor"`, `"motion_in"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, EnumString)]
pub enum ApiField {
    #[strum(serialize = "brightnessSensor")]
    BrightnessSensor,
    #[strum(serialize = "motion_in")]
    MotionIn,
    #[strum(serialize = "motion_out")]
    MotionOut,
    #[strum(serialize = "rfid")]
    Rfid,
    #[strum(serialize = "time")]
    Time,
    #[strum(serialize = "door")]
    Door,
    #[strum(serialize = "system")]
    System,
}

impl ApiField {
    pub const ALL: [Self; 7] = [
        Self::BrightnessSensor,
        Self::MotionIn,
        Self::MotionOut,
        Self::Rfid,
        Self::Time,
        Self::Door,
        Self::System,
    ];

    pub fn group(self) -> FieldGroup {
        match self {
            Self::BrightnessSensor | Self::MotionIn | Self::MotionOut | Self::Rfid | Self::Time => {
                FieldGroup::Mode
            }
            Self::Door | Self::System => FieldGroup::State,
        }
    }

    /// Name of the field in request and response bodies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::BrightnessSensor => "brightnessSensor",
            Self::MotionIn => "motion_in",
            Self::MotionOut => "motion_out",
            Self::Rfid => "rfid",
            Self::Time => "time",
            Self::Door => "door",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ApiField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ── Value vocabulary ─────────────────────────────────────────────────

/// Normalize a raw wire value into a boolean.
///
/// `closed`/`close`/`off` → `false`, `open`/`on` → `true`, booleans pass
/// through unchanged. Anything else is an invalid response value.
pub fn wire_to_value(field: &str, raw: &Value) -> Result<bool, Error> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            DOOR_CLOSED | DOOR_CLOSE | SYSTEM_OFF => Ok(false),
            DOOR_OPEN | SYSTEM_ON => Ok(true),
            _ => Err(invalid_value(field, raw)),
        },
        _ => Err(invalid_value(field, raw)),
    }
}

/// Translate a boolean into the value written for `field`.
///
/// Mode fields are written as booleans; `system` as `on`/`off`; `door` as
/// `open`/`close`.
pub fn value_to_wire(field: ApiField, value: bool) -> Value {
    match field {
        ApiField::System => Value::from(if value { SYSTEM_ON } else { SYSTEM_OFF }),
        ApiField::Door => Value::from(if value { DOOR_OPEN } else { DOOR_CLOSE }),
        _ => Value::Bool(value),
    }
}

fn invalid_value(field: &str, raw: &Value) -> Error {
    let err = Error::InvalidResponseValue {
        field: field.to_owned(),
        value: raw.to_string(),
    };
    error!("{err}");
    err
}

// ── Client ───────────────────────────────────────────────────────────

/// HTTP client for the device's local control API.
///
/// Reads return the raw field map exactly as received; writes translate
/// booleans through [`value_to_wire`] and expect `202 Accepted`.
#[derive(Debug)]
pub struct LocalClient {
    base_url: Url,
    http: HttpHandle,
}

impl LocalClient {
    /// Create a client for `http://{host}:{port}`.
    pub fn new(host: &str, port: u16, transport: TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}/"))?;
        Ok(Self::with_base_url(base_url, transport))
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(base_url: Url, transport: TransportConfig) -> Self {
        Self {
            base_url,
            http: HttpHandle::new(transport),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Scope the HTTP session to the returned guard.
    pub fn scope(&self) -> SessionScope<'_> {
        SessionScope::new(&self.http)
    }

    /// Release the HTTP session now.
    pub fn close(&self) {
        self.http.release();
    }

    pub fn is_open(&self) -> bool {
        self.http.is_open()
    }

    /// `GET /modes`
    pub async fn get_modes(&self) -> Result<Map<String, Value>, Error> {
        self.read(FieldGroup::Mode).await
    }

    /// `GET /states`
    pub async fn get_states(&self) -> Result<Map<String, Value>, Error> {
        self.read(FieldGroup::State).await
    }

    /// `PUT /modes` with `{ field: bool }`.
    pub async fn set_mode(&self, field: ApiField, value: bool) -> Result<(), Error> {
        if field.group() != FieldGroup::Mode {
            return Err(Error::UnknownState {
                field: field.wire_name().to_owned(),
            });
        }
        self.write(FieldGroup::Mode, json!({ field.wire_name(): value }))
            .await
    }

    /// `PUT /states` with `{ field: "on"|"off"|"open"|"close" }`.
    pub async fn set_state(&self, field: ApiField, value: bool) -> Result<(), Error> {
        if field.group() != FieldGroup::State {
            return Err(Error::UnknownState {
                field: field.wire_name().to_owned(),
            });
        }
        self.write(
            FieldGroup::State,
            json!({ field.wire_name(): value_to_wire(field, value) }),
        )
        .await
    }

    /// Write `value` to `field` through whichever endpoint owns it.
    pub async fn set_field(&self, field: ApiField, value: bool) -> Result<(), Error> {
        match field.group() {
            FieldGroup::Mode => self.set_mode(field, value).await,
            FieldGroup::State => self.set_state(field, value).await,
        }
    }

    fn url(&self, group: FieldGroup) -> Result<Url, Error> {
        Ok(self.base_url.join(group.path())?)
    }

    async fn read(&self, group: FieldGroup) -> Result<Map<String, Value>, Error> {
        let url = self.url(group)?;
        info!(%url, "calling local API with GET");

        let call = self.http.call();
        call.complete(self.read_inner(&url).await)
    }

    async fn read_inner(&self, url: &Url) -> Result<Map<String, Value>, Error> {
        let timeout = self.http.timeout();
        let resp = self
            .http
            .acquire()?
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::transport(url, timeout, &e))?;

        let status = resp.status().as_u16();
        if status != STATUS_READ_OK {
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

    async fn write(&self, group: FieldGroup, body: Value) -> Result<(), Error> {
        let url = self.url(group)?;
        info!(%url, "calling local API with PUT");
        debug!(%body, "request parameters");

        let call = self.http.call();
        call.complete(self.write_inner(&url, &body).await)
    }

    async fn write_inner(&self, url: &Url, body: &Value) -> Result<(), Error> {
        let timeout = self.http.timeout();
        let resp = self
            .http
            .acquire()?
            .put(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(url, timeout, &e))?;

        let status = resp.status().as_u16();
        if status != STATUS_WRITE_ACCEPTED {
            error!(%url, status, "incorrect status code received");
            return Err(Error::InvalidResponseStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }
}
