//! Window creation options.

use casement_webview::WebPreferences;
use serde::{Deserialize, Serialize};

/// Behaviour toggles carried by every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFlags {
    pub resizable: bool,
    pub closable: bool,
    pub fullscreenable: bool,
    pub always_on_top: bool,
    pub kiosk: bool,
    pub enabled: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            closable: true,
            fullscreenable: true,
            always_on_top: false,
            kiosk: false,
            enabled: true,
        }
    }
}

/// Options for [`crate::WindowManager::create`]. Unset geometry falls back
/// to the `[window]` config section; unset position centres the window on
/// the display work area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowOptions {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Centre on the work area. Wins over `x`/`y`.
    pub center: bool,
    pub min_width: i32,
    pub min_height: i32,
    /// 0 means unbounded.
    pub max_width: i32,
    pub max_height: i32,
    pub show: Option<bool>,
    pub title: String,
    pub resizable: bool,
    pub closable: bool,
    pub fullscreen: bool,
    pub fullscreenable: bool,
    pub always_on_top: bool,
    pub kiosk: bool,
    pub frame: bool,
    pub skip_taskbar: bool,
    /// `#rgb`, `#rrggbb` or `#aarrggbb`.
    pub background_color: Option<String>,
    pub web_preferences: WebPreferences,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            x: None,
            y: None,
            center: false,
            min_width: 0,
            min_height: 0,
            max_width: 0,
            max_height: 0,
            show: None,
            title: String::new(),
            resizable: true,
            closable: true,
            fullscreen: false,
            fullscreenable: true,
            always_on_top: false,
            kiosk: false,
            frame: true,
            skip_taskbar: false,
            background_color: None,
            web_preferences: WebPreferences::default(),
        }
    }
}

impl WindowOptions {
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub(crate) fn flags(&self) -> WindowFlags {
        WindowFlags {
            resizable: self.resizable,
            closable: self.closable,
            fullscreenable: self.fullscreenable,
            always_on_top: self.always_on_top,
            kiosk: self.kiosk,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_a_normal_framed_window() {
        let opts = WindowOptions::default();
        assert!(opts.frame);
        assert!(opts.resizable && opts.closable && opts.fullscreenable);
        assert!(!opts.kiosk && !opts.fullscreen);
        assert_eq!(opts.flags(), WindowFlags::default());
    }

    #[test]
    fn options_deserialize_from_camel_case() {
        let opts: WindowOptions = serde_json::from_value(json!({
            "width": 640,
            "height": 480,
            "alwaysOnTop": true,
            "skipTaskbar": true,
            "backgroundColor": "#202020",
            "webPreferences": { "zoomFactor": 1.5 }
        }))
        .unwrap();
        assert_eq!(opts.width, Some(640));
        assert!(opts.always_on_top);
        assert!(opts.skip_taskbar);
        assert!(opts.frame);
        assert_eq!(opts.web_preferences.zoom_factor, Some(1.5));
        assert!(opts.flags().always_on_top);
    }
}
