use std::path::PathBuf;
use std::time::Duration;

use crate::id::{ContentId, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("clipboard error: {0}")]
    ClipboardError(String),

    #[error("image error: {0}")]
    ImageError(String),

    #[error("path error: {0}")]
    PathError(String),

    #[error("not supported: {0}")]
    NotSupported(String),
}

/// Errors surfaced by window, content-process and bridge operations.
///
/// Geometry and constraint errors are raised synchronously and never leave
/// partial state behind. Cross-process failures (`ExecutionError`,
/// `IoFailure`, `RenderTimeout`, `EngineFailure`) arrive through the
/// rejection path of the operation's future.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("window {0} has been destroyed")]
    InstanceDestroyed(WindowId),

    #[error("content process {0} has been destroyed")]
    HandleDestroyed(ContentId),

    /// The injected script threw inside the content process.
    #[error("script execution failed: {description}")]
    ExecutionError { description: String },

    #[error("i/o failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} did not settle within {}ms", timeout.as_millis())]
    RenderTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The host-side engine failed; the content itself did not throw.
    #[error("engine failure: {0}")]
    EngineFailure(String),

    #[error("capability not granted: {0}")]
    CapabilityDenied(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl HostError {
    /// `true` for failures that originate inside the content process rather
    /// than in the host.
    pub fn is_content_side(&self) -> bool {
        matches!(self, Self::ExecutionError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("window.width out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: window.width out of range"
        );
    }

    #[test]
    fn platform_error_display() {
        let err = PlatformError::ClipboardError("access denied".into());
        assert_eq!(err.to_string(), "clipboard error: access denied");

        let err = PlatformError::NotSupported("rtf on system clipboard".into());
        assert_eq!(err.to_string(), "not supported: rtf on system clipboard");
    }

    #[test]
    fn host_error_display() {
        let err = HostError::InstanceDestroyed(WindowId(3));
        assert_eq!(err.to_string(), "window 3 has been destroyed");

        let err = HostError::HandleDestroyed(ContentId(7));
        assert_eq!(err.to_string(), "content process 7 has been destroyed");

        let err = HostError::RenderTimeout {
            operation: "printToPDF",
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "printToPDF did not settle within 250ms");
    }

    #[test]
    fn io_failure_keeps_path_and_source() {
        let err = HostError::IoFailure {
            path: PathBuf::from("/nope/page.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope/page.html"));
        assert!(msg.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn content_side_errors_are_distinguishable() {
        let content = HostError::ExecutionError {
            description: "ReferenceError: foo is not defined".into(),
        };
        let host = HostError::EngineFailure("renderer crashed".into());
        assert!(content.is_content_side());
        assert!(!host.is_content_side());
    }

    #[test]
    fn host_error_from_platform() {
        let err: HostError = PlatformError::ImageError("bad png".into()).into();
        assert!(matches!(err, HostError::Platform(_)));
        assert!(err.to_string().contains("bad png"));
    }

    #[test]
    fn host_error_from_config() {
        let err: HostError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, HostError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }
}
