use serde::{Deserialize, Serialize};

/// Window background colour. Hex strings use `#rgb`, `#rrggbb` or
/// `#aarrggbb` (alpha first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::from_rgba(255, 255, 255, 255)
    }
}

impl Color {
    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = byte(&hex[0..1].repeat(2))?;
                let g = byte(&hex[1..2].repeat(2))?;
                let b = byte(&hex[2..3].repeat(2))?;
                Some(Self::from_rgba(r, g, b, 255))
            }
            6 => Some(Self::from_rgba(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                255,
            )),
            8 => {
                let a = byte(&hex[0..2])?;
                Some(Self::from_rgba(
                    byte(&hex[2..4])?,
                    byte(&hex[4..6])?,
                    byte(&hex[6..8])?,
                    a,
                ))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
        }
    }
}
