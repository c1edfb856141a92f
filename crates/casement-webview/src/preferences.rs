//! Per-window web preferences and their resolution against config defaults.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use casement_config::ContentConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::bridge::Capability;

/// Frame rates outside this range are clamped.
pub const MIN_FRAME_RATE: u32 = 1;
pub const MAX_FRAME_RATE: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebRtcIpHandlingPolicy {
    #[default]
    Default,
    DefaultPublicInterfaceOnly,
    DefaultPublicAndPrivateInterfaces,
    DisableNonProxiedUdp,
}

impl WebRtcIpHandlingPolicy {
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::DefaultPublicInterfaceOnly => "default_public_interface_only",
            Self::DefaultPublicAndPrivateInterfaces => "default_public_and_private_interfaces",
            Self::DisableNonProxiedUdp => "disable_non_proxied_udp",
        }
    }
}

/// Preferences requested for a window's content process.
///
/// `extensions` carries open-ended keys. Recognised keys are
/// `backgroundThrottling` (bool), `webrtcIpHandlingPolicy` (string),
/// `frameRate` (number) and `offscreen` (bool); anything else is ignored
/// with a warning when the preferences are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebPreferences {
    pub dev_tools: Option<bool>,
    pub preload: Option<PathBuf>,
    pub zoom_factor: Option<f64>,
    /// Bridge grants. `None` grants [`Capability::default_grants`].
    pub capabilities: Option<BTreeSet<Capability>>,
    pub extensions: BTreeMap<String, Value>,
}

impl WebPreferences {
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn resolve(&self, config: &ContentConfig) -> ResolvedPreferences {
        let mut resolved = ResolvedPreferences {
            dev_tools: self.dev_tools.unwrap_or(config.devtools),
            preload: self.preload.clone(),
            zoom_factor: config.default_zoom,
            user_agent: config.user_agent.clone(),
            frame_rate: config.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE),
            background_throttling: true,
            webrtc_policy: WebRtcIpHandlingPolicy::default(),
            offscreen: false,
            capabilities: self
                .capabilities
                .clone()
                .unwrap_or_else(Capability::default_grants),
        };

        match self.zoom_factor {
            Some(zoom) if zoom.is_finite() && zoom > 0.0 => resolved.zoom_factor = zoom,
            Some(zoom) => warn!(zoom, "Ignoring non-positive zoom factor"),
            None => {}
        }

        for (key, value) in &self.extensions {
            let applied = match key.as_str() {
                "backgroundThrottling" => value
                    .as_bool()
                    .map(|on| resolved.background_throttling = on),
                "offscreen" => value.as_bool().map(|on| resolved.offscreen = on),
                "frameRate" => value
                    .as_f64()
                    .filter(|rate| rate.is_finite())
                    .map(|rate| resolved.frame_rate = clamp_frame_rate(rate)),
                "webrtcIpHandlingPolicy" => value
                    .as_str()
                    .and_then(WebRtcIpHandlingPolicy::parse)
                    .map(|policy| resolved.webrtc_policy = policy),
                _ => {
                    warn!(key = %key, "Ignoring unknown web preference");
                    continue;
                }
            };
            if applied.is_none() {
                warn!(key = %key, value = %value, "Ignoring web preference with unusable value");
            }
        }

        resolved
    }
}

/// Preferences after defaults and extension keys are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPreferences {
    pub dev_tools: bool,
    pub preload: Option<PathBuf>,
    pub zoom_factor: f64,
    pub user_agent: String,
    pub frame_rate: u32,
    pub background_throttling: bool,
    pub webrtc_policy: WebRtcIpHandlingPolicy,
    pub offscreen: bool,
    pub capabilities: BTreeSet<Capability>,
}

pub(crate) fn clamp_frame_rate(rate: f64) -> u32 {
    rate.round()
        .clamp(f64::from(MIN_FRAME_RATE), f64::from(MAX_FRAME_RATE)) as u32
}
