//! Core TOML config loading: read from path or platform default.

use crate::schema::HostConfig;
use crate::validation;
use casement_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. Validation failures are logged
/// and the parsed config is returned as-is; callers that need a hard check
/// run [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let config: HostConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path, writing a
/// documented default file first if none exists.
pub fn load_default() -> Result<HostConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(HostConfig::default())
        }
        Err(e) => Err(e),
    }
}
