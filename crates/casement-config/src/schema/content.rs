//! Content-process configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Defaults for content processes and their long-running operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Upper bound for print/save operations before they fail with a
    /// render timeout (valid range: 100-600000).
    pub render_timeout_ms: u64,
    pub user_agent: String,
    /// Zoom factor used when web preferences do not set one.
    pub default_zoom: f64,
    /// Allow developer tools unless web preferences disable them.
    pub devtools: bool,
    pub frame_rate: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 30_000,
            user_agent: "Casement/0.1".into(),
            default_zoom: 1.0,
            devtools: cfg!(debug_assertions),
            frame_rate: 60,
        }
    }
}

impl ContentConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}
