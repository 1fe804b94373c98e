//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use petwalk_config::ConfigError;
use petwalk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(petwalk::connection_failed),
        help(
            "Check that the door is powered and reachable on the local network,\n\
             or that the cloud endpoint is up.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Cloud authentication failed: {message}")]
    #[diagnostic(
        code(petwalk::auth_failed),
        help(
            "Verify the username and password of the profile.\n\
             Run: petwalk config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(petwalk::no_credentials),
        help(
            "Store a password with: petwalk config set-password --profile {profile}\n\
             Or set password_env in the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Device / API ─────────────────────────────────────────────────

    #[error("{url} answered with status {status}")]
    #[diagnostic(code(petwalk::status))]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(petwalk::invalid_response),
        help("Run with -vv to see the raw exchange.")
    )]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(petwalk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(petwalk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: petwalk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration could not be loaded")]
    #[diagnostic(code(petwalk::config), help("Config file: {path}"))]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(petwalk::confirmation_required),
        help("Re-run with --yes (-y) to execute it.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Could not render TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connection { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Authentication { message } | CoreError::InvalidTokens { message } => {
                CliError::AuthFailed { message }
            }

            CoreError::InvalidResponseStatus { url, status } => {
                CliError::UnexpectedStatus { url, status }
            }

            CoreError::InvalidResponseValue { field, value } => CliError::InvalidResponse {
                message: format!("unknown value {value} for {field}"),
            },

            CoreError::UnknownState { field } => CliError::Validation {
                field,
                reason: "not a state field".into(),
            },

            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },

            CoreError::Validation(err) => CliError::InvalidResponse {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            other => CliError::Config {
                path: petwalk_config::config_path().display().to_string(),
                source: other,
            },
        }
    }
}
