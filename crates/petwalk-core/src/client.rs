// ── PetWalk facade ──
//
// Single entry point over the three transports. Every operation turns raw
// transport output into domain values and maps failures into `CoreError`.
// Local and cloud operations hold a session scope so the HTTP handle is
// released when the call finishes, fails or is cancelled.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use petwalk_api::cloud::DEFAULT_TIMELINE_INTERVAL_DAYS;
use petwalk_api::{
    ApiField, CloudClient, CognitoIdentityProvider, CommandClient, DeviceCommand, FieldGroup,
    LocalClient, TransportConfig,
};

use crate::config::ClientConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Event, Pet};
use crate::status::reconcile_pet_status;

/// Client for one petWALK door and its cloud account.
#[derive(Debug)]
pub struct PetWalk {
    local: LocalClient,
    commands: CommandClient,
    cloud: CloudClient<CognitoIdentityProvider>,
}

impl PetWalk {
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let local = LocalClient::new(
            &config.host,
            config.api_port,
            TransportConfig::with_timeout(config.local_timeout),
        )?;
        let commands = CommandClient::new(&config.host, config.ws_port, config.local_timeout)?;

        let cloud_cfg = &config.cloud;
        let cloud_transport = TransportConfig::with_timeout(cloud_cfg.timeout);
        let provider = match &cloud_cfg.identity_url {
            Some(url) => CognitoIdentityProvider::with_endpoint(
                url.clone(),
                cloud_cfg.client_id.clone(),
                cloud_transport.clone(),
            ),
            None => CognitoIdentityProvider::new(
                &cloud_cfg.user_pool_id,
                cloud_cfg.client_id.clone(),
                cloud_transport.clone(),
            )?,
        };
        let cloud = CloudClient::new(
            cloud_cfg.url.clone(),
            cloud_cfg.username.clone(),
            cloud_cfg.password.clone(),
            provider,
            cloud_transport,
        )
        .with_client_version(cloud_cfg.client_version.clone());

        debug!(host = %config.host, "petWALK client created");
        Ok(Self {
            local,
            commands,
            cloud,
        })
    }

    pub fn local(&self) -> &LocalClient {
        &self.local
    }

    pub fn commands(&self) -> &CommandClient {
        &self.commands
    }

    pub fn cloud(&self) -> &CloudClient<CognitoIdentityProvider> {
        &self.cloud
    }

    // ── Local API ────────────────────────────────────────────────────

    /// All local fields as booleans. States override modes on key clashes.
    pub async fn get_api_data(&self) -> Result<BTreeMap<String, bool>, CoreError> {
        let _scope = self.local.scope();
        let modes = self.local.get_modes().await?;
        let states = self.local.get_states().await?;
        convert::normalize_api_data([&modes, &states])
    }

    pub async fn get_modes(&self) -> Result<Map<String, Value>, CoreError> {
        let _scope = self.local.scope();
        Ok(self.local.get_modes().await?)
    }

    pub async fn get_states(&self) -> Result<Map<String, Value>, CoreError> {
        let _scope = self.local.scope();
        Ok(self.local.get_states().await?)
    }

    /// Current value of one local field.
    pub async fn get_field(&self, field: ApiField) -> Result<bool, CoreError> {
        let _scope = self.local.scope();
        let map = match field.group() {
            FieldGroup::Mode => self.local.get_modes().await?,
            FieldGroup::State => self.local.get_states().await?,
        };
        convert::field_value(&map, field.wire_name())
    }

    /// Write one local field.
    pub async fn set_field(&self, field: ApiField, value: bool) -> Result<(), CoreError> {
        let _scope = self.local.scope();
        debug!(%field, value, "setting local field");
        Ok(self.local.set_field(field, value).await?)
    }

    pub async fn get_brightness_sensor(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::BrightnessSensor).await
    }

    pub async fn set_brightness_sensor(&self, value: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::BrightnessSensor, value).await
    }

    pub async fn get_motion_in(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::MotionIn).await
    }

    pub async fn set_motion_in(&self, value: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::MotionIn, value).await
    }

    pub async fn get_motion_out(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::MotionOut).await
    }

    pub async fn set_motion_out(&self, value: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::MotionOut, value).await
    }

    pub async fn get_rfid(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::Rfid).await
    }

    pub async fn set_rfid(&self, value: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::Rfid, value).await
    }

    pub async fn get_time(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::Time).await
    }

    pub async fn set_time(&self, value: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::Time, value).await
    }

    /// `true` when the door is open.
    pub async fn get_door_state(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::Door).await
    }

    /// Open (`true`) or close (`false`) the door.
    pub async fn set_door_state(&self, open: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::Door, open).await
    }

    /// `true` when the system is switched on.
    pub async fn get_system_state(&self) -> Result<bool, CoreError> {
        self.get_field(ApiField::System).await
    }

    pub async fn set_system_state(&self, on: bool) -> Result<(), CoreError> {
        self.set_field(ApiField::System, on).await
    }

    // ── Command socket ───────────────────────────────────────────────

    /// Run any command on the device and return its raw reply.
    pub async fn execute(&self, command: &DeviceCommand) -> Result<Value, CoreError> {
        Ok(self.commands.execute(command).await?)
    }

    /// Raw `DeviceInfo` reply.
    pub async fn get_device_info(&self) -> Result<Value, CoreError> {
        self.execute(&DeviceCommand::DeviceInfo).await
    }

    pub async fn get_device_name(&self) -> Result<String, CoreError> {
        convert::device_name(&self.get_device_info().await?)
    }

    pub async fn get_serial_number(&self) -> Result<String, CoreError> {
        convert::serial_number(&self.get_device_info().await?)
    }

    /// Firmware version without its leading component.
    pub async fn get_sw_version(&self) -> Result<String, CoreError> {
        convert::sw_version(&self.get_device_info().await?)
    }

    /// Registered pets, optionally followed by the unknown-pet placeholder.
    pub async fn get_available_pets(&self, include_unknown: bool) -> Result<Vec<Pet>, CoreError> {
        convert::available_pets(&self.get_device_info().await?, include_unknown)
    }

    // ── Cloud ────────────────────────────────────────────────────────

    pub async fn get_update_info(&self) -> Result<Value, CoreError> {
        let _scope = self.cloud.scope();
        Ok(self.cloud.get_update_info().await?)
    }

    pub async fn get_notification_settings(&self) -> Result<Value, CoreError> {
        let _scope = self.cloud.scope();
        Ok(self.cloud.get_notification_settings().await?)
    }

    /// Cloud id of this door.
    pub async fn get_device_id(&self) -> Result<i64, CoreError> {
        convert::device_id(&self.get_update_info().await?)
    }

    /// Raw timeline for `door_id`. `None` uses a one-day window.
    pub async fn get_timeline(
        &self,
        door_id: i64,
        interval_days: Option<u32>,
    ) -> Result<Value, CoreError> {
        let _scope = self.cloud.scope();
        let days = interval_days.unwrap_or(DEFAULT_TIMELINE_INTERVAL_DAYS);
        Ok(self.cloud.get_timeline(door_id, days).await?)
    }

    /// Latest open event per pet over the default timeline window.
    pub async fn get_pet_status(
        &self,
        door_id: i64,
        include_unknown: bool,
    ) -> Result<BTreeMap<String, Event>, CoreError> {
        let timeline = self.get_timeline(door_id, None).await?;
        reconcile_pet_status(convert::timeline_entries(&timeline)?, include_unknown)
    }
}
