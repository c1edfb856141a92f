//! Window and display configuration types.

use casement_common::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Defaults applied to windows created without explicit geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub default_width: u32,
    pub default_height: u32,
    /// Height of the frame's title bar; content bounds sit below it.
    /// Frameless windows ignore it.
    pub titlebar_height: u32,
    /// Whether windows are shown when `show` is not given at creation.
    pub show_on_create: bool,
    /// Background colour for new windows (`#rrggbb` or `#aarrggbb`).
    pub background_color: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_width: 800,
            default_height: 600,
            titlebar_height: 28,
            show_on_create: true,
            background_color: "#ffffff".into(),
        }
    }
}

impl WindowConfig {
    pub fn default_size(&self) -> Size {
        Size::new(clamp_i32(self.default_width), clamp_i32(self.default_height))
    }
}

/// The display windows are placed on. Maximize fills the work area
/// (display minus menu bar), fullscreen fills the whole display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub menu_bar_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            menu_bar_height: 25,
        }
    }
}

impl DisplayConfig {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, clamp_i32(self.width), clamp_i32(self.height))
    }

    pub fn work_area(&self) -> Rect {
        let inset = clamp_i32(self.menu_bar_height).min(clamp_i32(self.height));
        Rect::new(
            0,
            inset,
            clamp_i32(self.width),
            clamp_i32(self.height) - inset,
        )
    }
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
