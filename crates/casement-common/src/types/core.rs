use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// A rect of `size` centred inside `area`, pinned to the area origin if
    /// it does not fit.
    pub fn centered_in(area: Rect, size: Size) -> Self {
        let x = area.x + ((area.width - size.width) / 2).max(0);
        let y = area.y + ((area.height - size.height) / 2).max(0);
        Self::new(x, y, size.width, size.height)
    }

    /// Overlap of two rects. Edges are computed in `i64`, so rects reaching
    /// past `i32::MAX` intersect by their representable part.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let right = |r: &Rect| i64::from(r.x) + i64::from(r.width);
        let bottom = |r: &Rect| i64::from(r.y) + i64::from(r.height);
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = right(self).min(right(other));
        let y1 = bottom(self).min(bottom(other));
        if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
            return None;
        }
        let width = i32::try_from(x1 - i64::from(x0)).ok()?;
        let height = i32::try_from(y1 - i64::from(y0)).ok()?;
        Some(Rect::new(x0, y0, width, height))
    }
}

/// Width/height pair. `0` in a min/max constraint means "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const UNBOUNDED: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_unbounded(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Position/size state of a window. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    FullScreen,
    Destroyed,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Minimized => "minimized",
            Self::Maximized => "maximized",
            Self::FullScreen => "fullscreen",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
