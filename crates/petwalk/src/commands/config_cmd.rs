//! Config subcommand handlers.

use petwalk_config::Profile;

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init) => handle_init(init, global),

        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
            }
            let toml_str = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| toml_str.clone(),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&petwalk_config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { password } => {
            let cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            petwalk_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("Password for profile '{name}' stored in system keyring");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = config::active_profile_name(global, &cfg);
            let mut names: Vec<&String> = cfg.profiles.keys().collect();
            names.sort_unstable();
            let out = names
                .into_iter()
                .map(|n| if *n == default { format!("* {n}") } else { format!("  {n}") })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn handle_init(init: ConfigInitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = petwalk_config::config_path();
    let mut cfg = petwalk_config::load_config_from(&path).unwrap_or_default();
    let name = global.profile.clone().unwrap_or_else(|| "default".into());

    let profile = Profile {
        host: init.door_host,
        cloud_url: Some(init.cloud_url),
        user_pool_id: Some(init.user_pool_id),
        client_id: Some(init.client_id),
        username: Some(init.username),
        ..Profile::default()
    };
    cfg.profiles.insert(name.clone(), profile);
    if init.default || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }

    petwalk_config::save_config(&cfg)?;
    if !global.quiet {
        eprintln!("Profile '{name}' written to {}", path.display());
        eprintln!("Store the cloud password with: petwalk config set-password --profile {name}");
    }
    Ok(())
}
