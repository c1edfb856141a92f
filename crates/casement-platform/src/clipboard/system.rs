use std::borrow::Cow;

use casement_common::PlatformError;
use tracing::debug;

use super::{
    Bookmark, Clipboard, ClipboardData, ClipboardType, FORMAT_HTML, FORMAT_IMAGE, FORMAT_TEXT,
};
use crate::native_image::NativeImage;

/// OS clipboard backed by `arboard`.
///
/// Supports plain text, HTML (write only) and images on the regular
/// clipboard. The selection clipboard, RTF, bookmarks and custom buffer
/// formats report [`PlatformError::NotSupported`].
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, PlatformError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| PlatformError::ClipboardError(e.to_string()))?;
        Ok(Self { inner })
    }

    fn require_clipboard(kind: ClipboardType) -> Result<(), PlatformError> {
        match kind {
            ClipboardType::Clipboard => Ok(()),
            ClipboardType::Selection => Err(unsupported("selection clipboard")),
        }
    }
}

fn unsupported(what: &str) -> PlatformError {
    PlatformError::NotSupported(format!("{what} on the system clipboard"))
}

fn clipboard_err(e: arboard::Error) -> PlatformError {
    PlatformError::ClipboardError(e.to_string())
}

impl Clipboard for SystemClipboard {
    fn available_formats(&mut self, kind: ClipboardType) -> Vec<String> {
        if kind == ClipboardType::Selection {
            return Vec::new();
        }
        let mut formats = Vec::new();
        if self.inner.get_text().is_ok() {
            formats.push(FORMAT_TEXT.to_string());
        }
        if self.inner.get_image().is_ok() {
            formats.push(FORMAT_IMAGE.to_string());
        }
        formats
    }

    fn clear(&mut self, kind: ClipboardType) {
        if kind == ClipboardType::Clipboard {
            if let Err(e) = self.inner.clear() {
                debug!("system clipboard clear failed: {e}");
            }
        }
    }

    fn read_text(&mut self, kind: ClipboardType) -> Result<String, PlatformError> {
        Self::require_clipboard(kind)?;
        match self.inner.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(clipboard_err(e)),
        }
    }

    fn write_text(&mut self, text: &str, kind: ClipboardType) -> Result<(), PlatformError> {
        Self::require_clipboard(kind)?;
        self.inner.set_text(text.to_owned()).map_err(clipboard_err)
    }

    fn read_html(&mut self, _kind: ClipboardType) -> Result<String, PlatformError> {
        Err(unsupported("reading html"))
    }

    fn write_html(&mut self, markup: &str, kind: ClipboardType) -> Result<(), PlatformError> {
        Self::require_clipboard(kind)?;
        self.inner
            .set_html(markup.to_owned(), None::<String>)
            .map_err(clipboard_err)
    }

    fn read_rtf(&mut self, _kind: ClipboardType) -> Result<String, PlatformError> {
        Err(unsupported("rtf"))
    }

    fn write_rtf(&mut self, _rtf: &str, _kind: ClipboardType) -> Result<(), PlatformError> {
        Err(unsupported("rtf"))
    }

    fn read_bookmark(&mut self) -> Result<Bookmark, PlatformError> {
        Err(unsupported("bookmarks"))
    }

    fn write_bookmark(
        &mut self,
        _title: &str,
        _url: &str,
        _kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        Err(unsupported("bookmarks"))
    }

    fn read_buffer(&mut self, format: &str) -> Result<Vec<u8>, PlatformError> {
        match format {
            FORMAT_TEXT => Ok(self.read_text(ClipboardType::Clipboard)?.into_bytes()),
            FORMAT_IMAGE => self.read_image(ClipboardType::Clipboard)?.to_png(),
            other => Err(unsupported(other)),
        }
    }

    fn write_buffer(
        &mut self,
        format: &str,
        buffer: &[u8],
        kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        match format {
            FORMAT_TEXT => self.write_text(&String::from_utf8_lossy(buffer), kind),
            FORMAT_HTML => self.write_html(&String::from_utf8_lossy(buffer), kind),
            other => Err(unsupported(other)),
        }
    }

    fn read_image(&mut self, kind: ClipboardType) -> Result<NativeImage, PlatformError> {
        Self::require_clipboard(kind)?;
        match self.inner.get_image() {
            Ok(data) => NativeImage::from_bitmap(
                &data.bytes,
                data.width as u32,
                data.height as u32,
                1.0,
            ),
            Err(arboard::Error::ContentNotAvailable) => Ok(NativeImage::create_empty()),
            Err(e) => Err(clipboard_err(e)),
        }
    }

    fn write_image(
        &mut self,
        image: &NativeImage,
        kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        Self::require_clipboard(kind)?;
        let (width, height) = image.size();
        self.inner
            .set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Borrowed(image.to_bitmap()),
            })
            .map_err(clipboard_err)
    }

    fn write(&mut self, data: &ClipboardData, kind: ClipboardType) -> Result<(), PlatformError> {
        Self::require_clipboard(kind)?;
        if data.rtf.is_some() || data.bookmark.is_some() {
            return Err(unsupported("rtf/bookmark"));
        }
        if let Some(image) = &data.image {
            self.write_image(image, kind)?;
        }
        match (&data.html, &data.text) {
            (Some(html), alt) => self
                .inner
                .set_html(html.clone(), alt.clone())
                .map_err(clipboard_err),
            (None, Some(text)) => self.write_text(text, kind),
            (None, None) => Ok(()),
        }
    }
}
