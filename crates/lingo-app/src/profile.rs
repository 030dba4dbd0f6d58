use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lingo_config::Config;
use serde::{Deserialize, Serialize};

const MAIN_PROFILE: &str = "main";

/// `<config_dir>/lingo/profiles`
fn profiles_dir() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir().context("No config directory on this platform")?;
    Ok(config_dir.join("lingo").join("profiles"))
}

/// Represents a user profile
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

/// Create the main profile from the environment if it does not exist yet
pub fn init_user_config() -> anyhow::Result<PathBuf> {
    init_in(&profiles_dir()?)
}

/// Load a profile by name, falling back to main, then to the environment
pub fn load_user_profile(name: &str) -> anyhow::Result<Config> {
    match profiles_dir() {
        Ok(dir) => load_from(&dir, name),
        Err(e) => {
            tracing::warn!("{}, using environment config", e);
            Ok(Config::new())
        }
    }
}

fn init_in(dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let main_profile = dir.join(format!("{MAIN_PROFILE}.json"));

    if !main_profile.exists() {
        let profile = Profile {
            name: MAIN_PROFILE.into(),
            value: Config::new(),
        };
        fs::write(&main_profile, serde_json::to_string_pretty(&profile)?)?;
        tracing::info!("Created main profile at {}", main_profile.display());
    }

    Ok(main_profile)
}

fn load_from(dir: &Path, name: &str) -> anyhow::Result<Config> {
    let profile_file = dir.join(format!("{name}.json"));
    if profile_file.exists() {
        return read_profile(&profile_file);
    }

    let main_file = dir.join(format!("{MAIN_PROFILE}.json"));
    if name != MAIN_PROFILE && main_file.exists() {
        tracing::warn!("Profile {name} not found, falling back to main profile");
        return read_profile(&main_file);
    }

    tracing::debug!("No profile found, using environment config");
    Ok(Config::new())
}

fn read_profile(path: &Path) -> anyhow::Result<Config> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let profile: Profile = serde_json::from_str(&data)
        .with_context(|| format!("Invalid profile {}", path.display()))?;
    Ok(profile.value)
}
