//! WebSocket command socket client.
//!
//! Every command is a single request/reply exchange: open a socket to
//! `ws://{host}:{port}`, send one JSON text frame, wait for one data frame,
//! close. The device answers in an untyped JSON shape that is returned
//! verbatim; interpretation happens in `petwalk-core`.
//!
//! Wire envelope:
//!
//! ```json
//! {"requests": [{"function": "DeviceInfo", "params": []}]}
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;

/// Default port of the device's command socket.
pub const DEFAULT_WS_PORT: u16 = 1234;

/// Join type used when none is given to [`DeviceCommand::ZigBeeStartJoin`].
pub const ZIGBEE_DEFAULT_JOIN_TYPE: &str = "petWALK_ALB";

// ── Request envelope ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub function: String,
    pub params: Vec<Value>,
}

/// The `{"requests": [...]}` envelope sent over the socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRequest {
    pub requests: Vec<FunctionCall>,
}

impl CommandRequest {
    pub fn new(function: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            requests: vec![FunctionCall {
                function: function.into(),
                params,
            }],
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Deserialization {
            message: format!("failed to encode command request: {e}"),
            body: String::new(),
        })
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// Every command understood by the device's command socket.
#[derive(Debug, Clone)]
pub enum DeviceCommand {
    DeviceInfo,
    RfidStartLearn { slot: u32 },
    RfidStopLearn,
    RfidDelete { index: u32 },
    RfidDeleteAll,
    RfidDeletePet { pet_id: String },
    RfidTagList,
    RfidTagExists,
    ZigBeeListDevices,
    ZigBeeRemoveDevice { component_id: String },
    /// Open a join window. `None` uses [`ZIGBEE_DEFAULT_JOIN_TYPE`].
    ZigBeeStartJoin { join_type: Option<String> },
    ZigBeeJoinStatus,
    ZigBeeJoinConfirm { component_id: String },
    ZigBeeUpdate,
    ZigBeeNameDevice { component_id: String, name: String },
    WifiNetworkList,
    WifiNetworkSet { ssid: String, password: SecretString },
    WifiScan,
    TimeSet { time: String },
    FactoryReset,
    InitDriveStart,
}

impl DeviceCommand {
    /// Function name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceInfo => "DeviceInfo",
            Self::RfidStartLearn { .. } => "RFIDStartLearn",
            Self::RfidStopLearn => "RFIDStopLearn",
            Self::RfidDelete { .. } => "RFIDDelete",
            Self::RfidDeleteAll => "RFIDDeleteAll",
            Self::RfidDeletePet { .. } => "RFIDDeletePet",
            Self::RfidTagList => "RFIDTagList",
            Self::RfidTagExists => "RFIDTagExists",
            Self::ZigBeeListDevices => "ZigBeeListDevices",
            Self::ZigBeeRemoveDevice { .. } => "ZigBeeRemoveDevice",
            Self::ZigBeeStartJoin { .. } | Self::ZigBeeJoinStatus => "ZigBeeJoinAllowed",
            Self::ZigBeeJoinConfirm { .. } => "ZigBeeJoinConfirm",
            Self::ZigBeeUpdate => "ZigBeeUpdate",
            Self::ZigBeeNameDevice { .. } => "ZigBeeNameDevice",
            Self::WifiNetworkList => "WifiNetworkList",
            Self::WifiNetworkSet { .. } => "WifiNetworkSet",
            Self::WifiScan => "WifiScan",
            Self::TimeSet { .. } => "TimeSet",
            Self::FactoryReset => "FactoryReset",
            Self::InitDriveStart => "InitDriveStart",
        }
    }

    /// Positional parameters on the wire.
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::RfidStartLearn { slot } => vec![json!(slot)],
            Self::RfidDelete { index } => vec![json!(index)],
            Self::RfidDeletePet { pet_id } => vec![json!(pet_id)],
            Self::ZigBeeRemoveDevice { component_id } | Self::ZigBeeJoinConfirm { component_id } => {
                vec![json!(component_id)]
            }
            Self::ZigBeeStartJoin { join_type } => {
                let join_type = join_type
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or(ZIGBEE_DEFAULT_JOIN_TYPE);
                vec![json!("start"), json!(join_type)]
            }
            Self::ZigBeeNameDevice { component_id, name } => {
                vec![json!(component_id), json!(name)]
            }
            Self::WifiNetworkSet { ssid, password } => {
                vec![json!(ssid), json!(password.expose_secret()), json!(false)]
            }
            Self::TimeSet { time } => vec![json!(time)],
            _ => Vec::new(),
        }
    }

    pub fn request(&self) -> CommandRequest {
        CommandRequest::new(self.name(), self.params())
    }

    /// Commands that reset or recalibrate the device.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::FactoryReset | Self::InitDriveStart)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Client for the device's WebSocket command socket.
///
/// Holds no connection between calls.
#[derive(Debug, Clone)]
pub struct CommandClient {
    url: Url,
    timeout: Duration,
}

impl CommandClient {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, Error> {
        let url = Url::parse(&format!("ws://{host}:{port}"))?;
        Ok(Self { url, timeout })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run one command and return the device's reply.
    ///
    /// A reply that is not a text frame (binary, error, closed socket) is
    /// logged and yields an empty JSON object.
    pub async fn execute(&self, command: &DeviceCommand) -> Result<Value, Error> {
        if command.is_destructive() {
            warn!(command = command.name(), "destructive command triggered");
        }
        let payload = command.request().to_json()?;
        info!(url = %self.url, command = command.name(), "sending command");
        self.exchange(payload).await
    }

    async fn exchange(&self, payload: String) -> Result<Value, Error> {
        let connect = tokio_tungstenite::connect_async(self.url.as_str());
        let (mut ws, _response) = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| Error::Connection {
                url: self.url.to_string(),
                reason: e.to_string(),
            })?;

        let result = match ws.send(Message::text(payload)).await {
            Ok(()) => tokio::time::timeout(self.timeout, next_data_frame(&mut ws, &self.url))
                .await
                .map_err(|_| self.timed_out())
                .and_then(|reply| reply),
            Err(e) => Err(Error::WebSocket(e.to_string())),
        };

        if let Err(e) = ws.close(None).await {
            trace!(error = %e, "command socket already closed");
        }
        result
    }

    fn timed_out(&self) -> Error {
        Error::Timeout {
            url: self.url.to_string(),
            timeout: self.timeout,
        }
    }

    // ── Convenience wrappers ─────────────────────────────────────────

    pub async fn device_info(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::DeviceInfo).await
    }

    pub async fn rfid_start_learn(&self, slot: u32) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidStartLearn { slot }).await
    }

    pub async fn rfid_stop_learn(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidStopLearn).await
    }

    pub async fn rfid_delete(&self, index: u32) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidDelete { index }).await
    }

    pub async fn rfid_delete_all(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidDeleteAll).await
    }

    pub async fn rfid_delete_pet(&self, pet_id: &str) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidDeletePet {
            pet_id: pet_id.to_owned(),
        })
        .await
    }

    pub async fn rfid_tag_list(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidTagList).await
    }

    pub async fn rfid_tag_exists(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::RfidTagExists).await
    }

    pub async fn zigbee_list_devices(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeListDevices).await
    }

    pub async fn zigbee_remove_device(&self, component_id: &str) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeRemoveDevice {
            component_id: component_id.to_owned(),
        })
        .await
    }

    pub async fn zigbee_start_join(&self, join_type: Option<&str>) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeStartJoin {
            join_type: join_type.map(str::to_owned),
        })
        .await
    }

    pub async fn zigbee_join_status(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeJoinStatus).await
    }

    pub async fn zigbee_join_confirm(&self, component_id: &str) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeJoinConfirm {
            component_id: component_id.to_owned(),
        })
        .await
    }

    pub async fn zigbee_update(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeUpdate).await
    }

    pub async fn zigbee_name_device(&self, component_id: &str, name: &str) -> Result<Value, Error> {
        self.execute(&DeviceCommand::ZigBeeNameDevice {
            component_id: component_id.to_owned(),
            name: name.to_owned(),
        })
        .await
    }

    pub async fn wifi_network_list(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::WifiNetworkList).await
    }

    pub async fn wifi_network_set(&self, ssid: &str, password: SecretString) -> Result<Value, Error> {
        self.execute(&DeviceCommand::WifiNetworkSet {
            ssid: ssid.to_owned(),
            password,
        })
        .await
    }

    pub async fn wifi_scan(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::WifiScan).await
    }

    pub async fn time_set(&self, time: &str) -> Result<Value, Error> {
        self.execute(&DeviceCommand::TimeSet {
            time: time.to_owned(),
        })
        .await
    }

    pub async fn factory_reset(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::FactoryReset).await
    }

    pub async fn init_drive_start(&self) -> Result<Value, Error> {
        self.execute(&DeviceCommand::InitDriveStart).await
    }
}

/// Wait for the first data frame and decode it.
async fn next_data_frame<S>(stream: &mut S, url: &Url) -> Result<Value, Error>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!(len = text.len(), "command reply received");
                return serde_json::from_str(text.as_str())
                    .map_err(|e| Error::deserialization(&e, text.as_str()));
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Binary(data))) => {
                debug!(len = data.len(), "non-text command reply ignored");
                return Ok(no_data());
            }
            Some(Ok(Message::Close(_))) | None => {
                debug!(%url, "command socket closed before a reply");
                return Ok(no_data());
            }
            Some(Err(e)) => {
                error!(%url, error = %e, "command socket error");
                return Ok(no_data());
            }
        }
    }
}

fn no_data() -> Value {
    Value::Object(Map::new())
}
