use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use datasim_client::ClientConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no config directory available")]
    NoConfigDir,
}

/// On-disk CLI configuration (TOML).
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client: ClientConfig,
}

fn config_dir() -> Result<PathBuf, SettingsError> {
    dirs::config_dir()
        .map(|dir| dir.join("datasim"))
        .ok_or(SettingsError::NoConfigDir)
}

fn token_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join("token"))
}

/// Load settings from `path`, or from the default location when it exists,
/// applying the endpoint override last.
pub fn load(path: Option<&Path>, endpoint: Option<&str>) -> Result<Settings, SettingsError> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = config_dir()?.join("config.toml");
            default.exists().then_some(default)
        }
    };

    let mut settings = match path {
        Some(path) => toml::from_str(&fs::read_to_string(&path)?)?,
        None => Settings::default(),
    };

    if let Some(endpoint) = endpoint {
        settings.client.base_url = endpoint.trim_end_matches('/').to_string();
    }
    Ok(settings)
}

/// Persist the session token under the well-known path.
pub fn store_token(token: &str) -> Result<(), SettingsError> {
    let path = token_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, token)?;
    Ok(())
}

/// Read the stored session token, if any.
pub fn load_token() -> Result<Option<String>, SettingsError> {
    match fs::read_to_string(token_path()?) {
        Ok(token) => {
            let token = token.trim().to_string();
            Ok((!token.is_empty()).then_some(token))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Remove the stored session token. Removing an absent token is not an
/// error.
pub fn clear_token() -> Result<(), SettingsError> {
    match fs::remove_file(token_path()?) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
