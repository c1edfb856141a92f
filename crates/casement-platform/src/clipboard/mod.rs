//! Clipboard subsystem.
//!
//! [`Clipboard`] is the interface the host consumes. [`MemoryClipboard`]
//! keeps everything in-process and supports every format;
//! [`SystemClipboard`] talks to the OS clipboard through `arboard` and
//! supports the formats arboard exposes.

mod memory;
mod system;

pub use memory::MemoryClipboard;
pub use system::SystemClipboard;

use casement_common::PlatformError;
use serde::{Deserialize, Serialize};

use crate::native_image::NativeImage;

pub const FORMAT_TEXT: &str = "text/plain";
pub const FORMAT_HTML: &str = "text/html";
pub const FORMAT_RTF: &str = "text/rtf";
pub const FORMAT_IMAGE: &str = "image/png";
pub const FORMAT_BOOKMARK: &str = "text/x-bookmark";

/// Which OS clipboard a call addresses. `Selection` is the X11 primary
/// selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardType {
    #[default]
    Clipboard,
    Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
}

/// Several representations written in one call.
#[derive(Debug, Clone, Default)]
pub struct ClipboardData {
    pub text: Option<String>,
    pub html: Option<String>,
    pub rtf: Option<String>,
    pub image: Option<NativeImage>,
    pub bookmark: Option<Bookmark>,
}

/// Synchronous clipboard access. Reads of an absent format return an empty
/// value rather than an error; errors mean the backend itself failed or
/// does not support the format.
pub trait Clipboard: Send {
    fn available_formats(&mut self, kind: ClipboardType) -> Vec<String>;
    fn clear(&mut self, kind: ClipboardType);

    fn has(&mut self, format: &str, kind: ClipboardType) -> bool {
        self.available_formats(kind).iter().any(|f| f == format)
    }

    fn read_text(&mut self, kind: ClipboardType) -> Result<String, PlatformError>;
    fn write_text(&mut self, text: &str, kind: ClipboardType) -> Result<(), PlatformError>;

    fn read_html(&mut self, kind: ClipboardType) -> Result<String, PlatformError>;
    fn write_html(&mut self, markup: &str, kind: ClipboardType) -> Result<(), PlatformError>;

    fn read_rtf(&mut self, kind: ClipboardType) -> Result<String, PlatformError>;
    fn write_rtf(&mut self, rtf: &str, kind: ClipboardType) -> Result<(), PlatformError>;

    fn read_bookmark(&mut self) -> Result<Bookmark, PlatformError>;
    fn write_bookmark(
        &mut self,
        title: &str,
        url: &str,
        kind: ClipboardType,
    ) -> Result<(), PlatformError>;

    fn read_buffer(&mut self, format: &str) -> Result<Vec<u8>, PlatformError>;
    fn write_buffer(
        &mut self,
        format: &str,
        buffer: &[u8],
        kind: ClipboardType,
    ) -> Result<(), PlatformError>;

    fn read_image(&mut self, kind: ClipboardType) -> Result<NativeImage, PlatformError>;
    fn write_image(&mut self, image: &NativeImage, kind: ClipboardType)
        -> Result<(), PlatformError>;

    /// Read a format as UTF-8 text.
    fn read(&mut self, format: &str) -> Result<String, PlatformError> {
        let bytes = self.read_buffer(format)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Replace the clipboard with every representation present in `data`.
    fn write(&mut self, data: &ClipboardData, kind: ClipboardType) -> Result<(), PlatformError>;
}
