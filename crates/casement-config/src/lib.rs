//! Casement configuration system.
//!
//! TOML-based configuration with full validation. Every section uses
//! serde defaults so a partial file, or no file at all, works.
//!
//! ```rust,no_run
//! use casement_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ContentConfig, DisplayConfig, HostConfig, IpcConfig, LogLevel, LoggingConfig, WindowConfig,
    CONFIG_SCHEMA_VERSION,
};
pub use toml_loader::{load_default, load_from_path};

use casement_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<HostConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &HostConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&HostConfig::default());
        assert!(json.contains("\"window\""));
        assert!(json.contains("\"display\""));
        assert!(json.contains("\"content\""));
        assert!(json.contains("\"ipc\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&HostConfig::default());
        let parsed: HostConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.window.default_width, 800);
        assert_eq!(parsed.content.render_timeout_ms, 30_000);
        assert_eq!(parsed.ipc.queue_warn_depth, 10_000);
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }
}
