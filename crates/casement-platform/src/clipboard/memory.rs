use std::collections::{BTreeMap, HashMap};

use casement_common::PlatformError;

use super::{
    Bookmark, Clipboard, ClipboardData, ClipboardType, FORMAT_BOOKMARK, FORMAT_HTML,
    FORMAT_IMAGE, FORMAT_RTF, FORMAT_TEXT,
};
use crate::native_image::NativeImage;

#[derive(Debug, Default)]
struct Store {
    formats: BTreeMap<String, Vec<u8>>,
    image: Option<NativeImage>,
}

/// In-process clipboard holding every format, one store per
/// [`ClipboardType`]. Each write replaces the previous contents of that
/// store, like an OS clipboard does.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    stores: HashMap<ClipboardType, Store>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&mut self, kind: ClipboardType) -> &mut Store {
        self.stores.entry(kind).or_default()
    }

    fn read_string(&mut self, format: &str, kind: ClipboardType) -> String {
        self.store(kind)
            .formats
            .get(format)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    fn replace(&mut self, kind: ClipboardType, format: &str, bytes: Vec<u8>) {
        let store = self.store(kind);
        store.formats.clear();
        store.image = None;
        store.formats.insert(format.to_string(), bytes);
    }
}

impl Clipboard for MemoryClipboard {
    fn available_formats(&mut self, kind: ClipboardType) -> Vec<String> {
        let store = self.store(kind);
        let mut formats: Vec<String> = store.formats.keys().cloned().collect();
        if store.image.is_some() {
            formats.push(FORMAT_IMAGE.to_string());
        }
        formats
    }

    fn clear(&mut self, kind: ClipboardType) {
        self.stores.remove(&kind);
    }

    fn read_text(&mut self, kind: ClipboardType) -> Result<String, PlatformError> {
        Ok(self.read_string(FORMAT_TEXT, kind))
    }

    fn write_text(&mut self, text: &str, kind: ClipboardType) -> Result<(), PlatformError> {
        self.replace(kind, FORMAT_TEXT, text.as_bytes().to_vec());
        Ok(())
    }

    fn read_html(&mut self, kind: ClipboardType) -> Result<String, PlatformError> {
        Ok(self.read_string(FORMAT_HTML, kind))
    }

    fn write_html(&mut self, markup: &str, kind: ClipboardType) -> Result<(), PlatformError> {
        self.replace(kind, FORMAT_HTML, markup.as_bytes().to_vec());
        Ok(())
    }

    fn read_rtf(&mut self, kind: ClipboardType) -> Result<String, PlatformError> {
        Ok(self.read_string(FORMAT_RTF, kind))
    }

    fn write_rtf(&mut self, rtf: &str, kind: ClipboardType) -> Result<(), PlatformError> {
        self.replace(kind, FORMAT_RTF, rtf.as_bytes().to_vec());
        Ok(())
    }

    fn read_bookmark(&mut self) -> Result<Bookmark, PlatformError> {
        match self.store(ClipboardType::Clipboard).formats.get(FORMAT_BOOKMARK) {
            Some(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| PlatformError::ClipboardError(format!("corrupt bookmark: {e}"))),
            None => Ok(Bookmark::default()),
        }
    }

    fn write_bookmark(
        &mut self,
        title: &str,
        url: &str,
        kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        let bookmark = Bookmark {
            title: title.to_string(),
            url: url.to_string(),
        };
        let bytes = serde_json::to_vec(&bookmark)
            .map_err(|e| PlatformError::ClipboardError(e.to_string()))?;
        self.replace(kind, FORMAT_BOOKMARK, bytes);
        self.store(kind)
            .formats
            .insert(FORMAT_TEXT.to_string(), url.as_bytes().to_vec());
        Ok(())
    }

    fn read_buffer(&mut self, format: &str) -> Result<Vec<u8>, PlatformError> {
        let store = self.store(ClipboardType::Clipboard);
        if format == FORMAT_IMAGE {
            return match &store.image {
                Some(img) => img.to_png(),
                None => Ok(Vec::new()),
            };
        }
        Ok(store.formats.get(format).cloned().unwrap_or_default())
    }

    fn write_buffer(
        &mut self,
        format: &str,
        buffer: &[u8],
        kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        self.replace(kind, format, buffer.to_vec());
        Ok(())
    }

    fn read_image(&mut self, kind: ClipboardType) -> Result<NativeImage, PlatformError> {
        Ok(self.store(kind).image.clone().unwrap_or_default())
    }

    fn write_image(
        &mut self,
        image: &NativeImage,
        kind: ClipboardType,
    ) -> Result<(), PlatformError> {
        let store = self.store(kind);
        store.formats.clear();
        store.image = Some(image.clone());
        Ok(())
    }

    fn write(&mut self, data: &ClipboardData, kind: ClipboardType) -> Result<(), PlatformError> {
        let mut fresh = Store::default();
        if let Some(text) = &data.text {
            fresh.formats.insert(FORMAT_TEXT.into(), text.as_bytes().to_vec());
        }
        if let Some(html) = &data.html {
            fresh.formats.insert(FORMAT_HTML.into(), html.as_bytes().to_vec());
        }
        if let Some(rtf) = &data.rtf {
            fresh.formats.insert(FORMAT_RTF.into(), rtf.as_bytes().to_vec());
        }
        if let Some(bookmark) = &data.bookmark {
            let bytes = serde_json::to_vec(bookmark)
                .map_err(|e| PlatformError::ClipboardError(e.to_string()))?;
            fresh.formats.insert(FORMAT_BOOKMARK.into(), bytes);
        }
        fresh.image = data.image.clone();
        self.stores.insert(kind, fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        let mut cb = MemoryClipboard::new();
        cb.write_text("hello", ClipboardType::Clipboard).unwrap();
        assert_eq!(cb.read_text(ClipboardType::Clipboard).unwrap(), "hello");
        assert!(cb.has(FORMAT_TEXT, ClipboardType::Clipboard));
    }

    #[test]
    fn selection_and_clipboard_are_separate() {
        let mut cb = MemoryClipboard::new();
        cb.write_text("primary", ClipboardType::Selection).unwrap();
        assert_eq!(cb.read_text(ClipboardType::Clipboard).unwrap(), "");
        assert_eq!(cb.read_text(ClipboardType::Selection).unwrap(), "primary");
    }

    #[test]
    fn write_replaces_previous_formats() {
        let mut cb = MemoryClipboard::new();
        cb.write_html("<b>x</b>", ClipboardType::Clipboard).unwrap();
        cb.write_text("plain", ClipboardType::Clipboard).unwrap();
        assert_eq!(cb.read_html(ClipboardType::Clipboard).unwrap(), "");
        assert_eq!(
            cb.available_formats(ClipboardType::Clipboard),
            vec![FORMAT_TEXT.to_string()]
        );
    }

    #[test]
    fn multi_format_write() {
        let mut cb = MemoryClipboard::new();
        let data = ClipboardData {
            text: Some("t".into()),
            html: Some("<i>t</i>".into()),
            rtf: Some("{\\rtf1 t}".into()),
            image: Some(NativeImage::filled(2, 2, [0, 0, 0, 255])),
            bookmark: None,
        };
        cb.write(&data, ClipboardType::Clipboard).unwrap();

        let formats = cb.available_formats(ClipboardType::Clipboard);
        assert_eq!(formats.len(), 4);
        assert_eq!(cb.read_rtf(ClipboardType::Clipboard).unwrap(), "{\\rtf1 t}");
        assert_eq!(cb.read_image(ClipboardType::Clipboard).unwrap().size(), (2, 2));
    }

    #[test]
    fn bookmark_round_trip_also_sets_text() {
        let mut cb = MemoryClipboard::new();
        cb.write_bookmark("Example", "https://example.com", ClipboardType::Clipboard)
            .unwrap();
        let bm = cb.read_bookmark().unwrap();
        assert_eq!(bm.title, "Example");
        assert_eq!(bm.url, "https://example.com");
        assert_eq!(
            cb.read_text(ClipboardType::Clipboard).unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn custom_buffer_format() {
        let mut cb = MemoryClipboard::new();
        cb.write_buffer("application/x-casement", &[1, 2, 3], ClipboardType::Clipboard)
            .unwrap();
        assert_eq!(cb.read_buffer("application/x-casement").unwrap(), vec![1, 2, 3]);
        assert_eq!(cb.read("application/x-missing").unwrap(), "");
    }

    #[test]
    fn image_buffer_reads_as_png() {
        let mut cb = MemoryClipboard::new();
        let img = NativeImage::filled(3, 1, [9, 8, 7, 255]);
        cb.write_image(&img, ClipboardType::Clipboard).unwrap();
        let png = cb.read_buffer(FORMAT_IMAGE).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn clear_empties_only_that_store() {
        let mut cb = MemoryClipboard::new();
        cb.write_text("a", ClipboardType::Clipboard).unwrap();
        cb.write_text("b", ClipboardType::Selection).unwrap();
        cb.clear(ClipboardType::Clipboard);
        assert!(cb.available_formats(ClipboardType::Clipboard).is_empty());
        assert_eq!(cb.read_text(ClipboardType::Selection).unwrap(), "b");
    }

    #[test]
    fn empty_reads_are_not_errors() {
        let mut cb = MemoryClipboard::new();
        assert_eq!(cb.read_bookmark().unwrap(), Bookmark::default());
        assert!(cb.read_image(ClipboardType::Clipboard).unwrap().is_empty());
    }
}
