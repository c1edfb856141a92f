//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod content;
mod system;
mod window;

pub use content::*;
pub use system::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the casement host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub window: WindowConfig,
    pub display: DisplayConfig,
    pub content: ContentConfig,
    pub ipc: IpcConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.window.default_width, 800);
        assert_eq!(config.window.default_height, 600);
        assert_eq!(config.display.width, 1920);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml_str = r#"
[content]
render_timeout_ms = 500

[logging]
level = "DEBUG"
"#;
        let config: HostConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.content.render_timeout_ms, 500);
        assert_eq!(config.content.user_agent, "Casement/0.1");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.ipc.queue_warn_depth, 10_000);
    }
}
