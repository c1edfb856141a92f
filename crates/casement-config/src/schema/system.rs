//! IPC and logging configuration.

use serde::{Deserialize, Serialize};

/// IPC delivery settings. Queues are unbounded; the depth threshold only
/// controls when a warning is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    pub queue_warn_depth: usize,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            queue_warn_depth: 10_000,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_directive() {
        assert_eq!(LogLevel::Warning.as_directive(), "warn");
        assert_eq!(LogLevel::default().as_directive(), "info");
    }

    #[test]
    fn log_level_parses_uppercase() {
        let config: LoggingConfig = toml::from_str("level = \"ERROR\"").unwrap();
        assert_eq!(config.level, LogLevel::Error);
    }
}
