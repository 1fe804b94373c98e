//! Profile selection and CLI flag overrides on top of `petwalk-config`.

use std::time::Duration;

use petwalk_config::{Config, Profile};
use petwalk_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load config, falling back to defaults if the file is absent or malformed.
pub fn load_config_or_default() -> Config {
    petwalk_config::load_config().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable config file");
        Config::default()
    })
}

/// Profile name from `--profile`, the config's default, or "default".
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the active profile plus CLI overrides.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = petwalk_config::load_config()?;
    let name = active_profile_name(global, &cfg);

    let (_, profile) = cfg
        .profile(Some(&name))
        .map_err(|_| CliError::ProfileNotFound {
            name: name.clone(),
            available: available_profiles(&cfg),
        })?;

    let mut config =
        petwalk_config::profile_to_client_config(&with_overrides(profile, global), &name, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        config = config.with_local_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn with_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut profile = profile.clone();
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    profile
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
