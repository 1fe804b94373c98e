//! Clap derive structures for the `petwalk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use petwalk_core::ApiField;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// petwalk -- control a petWALK pet door from the command line
#[derive(Debug, Parser)]
#[command(
    name = "petwalk",
    version,
    about = "Control a petWALK pet door from the command line",
    long_about = "Reads and switches the door's local modes and states, runs \
        device commands over the command socket, and queries the petWALK \
        cloud for pet activity.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Door profile to use
    #[arg(long, short = 'p', env = "PETWALK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Door hostname or IP (overrides profile)
    #[arg(long, short = 'H', env = "PETWALK_HOST", global = true)]
    pub host: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PETWALK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation for destructive device commands
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Local request timeout in seconds (overrides profile)
    #[arg(long, env = "PETWALK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every local mode and state
    #[command(alias = "st")]
    Status,

    /// Read one local field
    Get {
        /// Field name (brightnessSensor, motion_in, motion_out, rfid, time, door, system)
        #[arg(value_parser = parse_field)]
        field: ApiField,
    },

    /// Write one local field
    Set {
        /// Field name (brightnessSensor, motion_in, motion_out, rfid, time, door, system)
        #[arg(value_parser = parse_field)]
        field: ApiField,

        /// on/off, true/false, open/close
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Open, close or inspect the door
    Door(DoorArgs),

    /// Switch the door system on or off
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Device metadata from the command socket
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Registered pets and their last activity
    Pets(PetsArgs),

    /// Cloud account data
    Cloud(CloudArgs),

    /// Run a raw device command over the command socket
    #[command(alias = "x")]
    Exec(ExecArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),
}

// ── Door / System ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DoorArgs {
    #[command(subcommand)]
    pub command: DoorCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorCommand {
    /// Show whether the door is open
    Status,
    /// Open the door
    Open,
    /// Close the door
    Close,
}

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Show whether the system is on
    Status,
    /// Switch the system on
    On,
    /// Switch the system off
    Off,
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Raw device information
    Info,
    /// Device name
    Name,
    /// Serial number
    Serial,
    /// Firmware version
    Version,
}

// ── Pets ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PetsArgs {
    #[command(subcommand)]
    pub command: PetsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PetsCommand {
    /// List pets registered on the door
    #[command(alias = "ls")]
    List {
        /// Append the placeholder for unrecognised pets
        #[arg(long)]
        include_unknown: bool,
    },

    /// Last door opening per pet
    Status {
        /// Cloud door id (looked up when omitted)
        #[arg(long)]
        door_id: Option<i64>,

        /// Report openings no pet could be matched to
        #[arg(long)]
        include_unknown: bool,
    },
}

// ── Cloud ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CloudArgs {
    #[command(subcommand)]
    pub command: CloudCommand,
}

#[derive(Debug, Subcommand)]
pub enum CloudCommand {
    /// Firmware update information
    UpdateInfo,
    /// Notification settings
    Notifications,
    /// Cloud id of the door
    DeviceId,
    /// Door events over the last days
    Timeline {
        /// Cloud door id (looked up when omitted)
        #[arg(long)]
        door_id: Option<i64>,

        /// Window size in days
        #[arg(long, short = 'd')]
        days: Option<u32>,
    },
}

// ── Exec ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExecArgs {
    #[command(subcommand)]
    pub command: ExecCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExecCommand {
    /// Start learning an RFID tag into a slot
    RfidLearn {
        #[arg(long)]
        slot: u32,
    },
    /// Stop RFID learning
    RfidStop,
    /// Delete the RFID tag at an index
    RfidDelete {
        #[arg(long)]
        index: u32,
    },
    /// Delete every RFID tag
    RfidDeleteAll,
    /// Delete the tags of one pet
    RfidDeletePet {
        #[arg(long)]
        pet_id: String,
    },
    /// List learned RFID tags
    RfidTags,
    /// Check whether a tag is present
    RfidTagExists,
    /// List paired ZigBee devices
    ZigbeeDevices,
    /// Remove a ZigBee device
    ZigbeeRemove {
        #[arg(long)]
        component_id: String,
    },
    /// Open a ZigBee join window
    ZigbeeJoin {
        /// Join type (defaults to the door's own accessory type)
        #[arg(long)]
        join_type: Option<String>,
    },
    /// Poll the ZigBee join window
    ZigbeeJoinStatus,
    /// Confirm a joined ZigBee device
    ZigbeeConfirm {
        #[arg(long)]
        component_id: String,
    },
    /// Update ZigBee firmware
    ZigbeeUpdate,
    /// Rename a ZigBee device
    ZigbeeName {
        #[arg(long)]
        component_id: String,
        #[arg(long)]
        name: String,
    },
    /// List stored WiFi networks
    WifiList,
    /// Scan for WiFi networks
    WifiScan,
    /// Store WiFi credentials on the door
    WifiSet {
        #[arg(long)]
        ssid: String,
        #[arg(long, env = "PETWALK_WIFI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Set the device clock
    TimeSet {
        /// Time string as expected by the device
        time: String,
    },
    /// Reset the door to factory settings
    FactoryReset,
    /// Start the drive calibration run
    InitDrive,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or replace a profile
    Init(ConfigInitArgs),

    /// Show the current configuration (passwords redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store the cloud password in the system keyring
    SetPassword {
        #[arg(long, env = "PETWALK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List configured profiles
    Profiles,
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Door hostname or IP
    #[arg(long)]
    pub door_host: String,

    /// Cloud API base URL
    #[arg(long)]
    pub cloud_url: String,

    /// Cognito user pool id
    #[arg(long)]
    pub user_pool_id: String,

    /// Cognito app client id
    #[arg(long)]
    pub client_id: String,

    /// Cloud account username
    #[arg(long)]
    pub username: String,

    /// Make this the default profile
    #[arg(long)]
    pub default: bool,
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_field(raw: &str) -> Result<ApiField, String> {
    raw.parse().map_err(|_| {
        let known: Vec<&str> = ApiField::ALL.iter().map(|f| f.wire_name()).collect();
        format!("unknown field '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "open" | "1" => Ok(true),
        "off" | "false" | "close" | "closed" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got '{raw}'")),
    }
}
