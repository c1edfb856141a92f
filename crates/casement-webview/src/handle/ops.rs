//! Cross-process operations. Each resolves exactly once through its future.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::PoisonError;
use std::time::Duration;

use casement_common::{HostError, Rect};
use casement_platform::{Clipboard, ClipboardType, NativeImage};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::find::{FindOptions, FindResult, FindSession, StopFindAction};
use super::ContentHandle;
use crate::engine::{
    ContentEngine, CssOrigin, EngineError, EngineSetting, PrintOptions, PrintSettings, SaveType,
};

const SETTLE_POLL: Duration = Duration::from_millis(10);

impl ContentHandle {
    /// Run `code` in the page. A thrown exception rejects with
    /// [`HostError::ExecutionError`].
    pub async fn execute_javascript(&self, code: &str, user_gesture: bool) -> Result<Value, HostError> {
        let engine = self.engine()?;
        engine
            .execute_javascript(code, user_gesture)
            .await
            .map_err(HostError::from)
    }

    /// Snapshot the page, cropped to `rect` when given. Resolves to an
    /// empty image when painting is stopped or nothing has been rendered.
    pub async fn capture_page(&self, rect: Option<Rect>) -> Result<NativeImage, HostError> {
        if !self.is_painting()? {
            debug!(content_id = %self.inner.id, "Capture while not painting");
            return Ok(NativeImage::create_empty());
        }
        let engine = self.engine()?;
        let _capturing = InFlight::enter(&self.inner.captures);
        let frame = self.bounded("capturePage", engine.capture()).await?;
        Ok(match (frame, rect) {
            (None, _) => NativeImage::create_empty(),
            (Some(image), None) => image,
            (Some(image), Some(rect)) => image.crop(rect),
        })
    }

    /// Waits for the document to settle, then prints. Bounded by the
    /// render timeout.
    pub async fn print_to_pdf(&self, options: PrintOptions) -> Result<Vec<u8>, HostError> {
        let engine = self.engine()?;
        let pdf = self
            .bounded("printToPDF", async {
                settled(engine).await;
                engine.print_to_pdf(&options).await
            })
            .await?;
        debug!(content_id = %self.inner.id, bytes = pdf.len(), "Printed to PDF");
        Ok(pdf)
    }

    /// Print to a device. `device_name: None` picks the default printer.
    pub async fn print(&self, settings: PrintSettings) -> Result<(), HostError> {
        let engine = self.engine()?;
        self.bounded("print", async {
            settled(engine).await;
            engine.print(&settings).await
        })
        .await?;
        info!(
            content_id = %self.inner.id,
            printer = settings.device_name.as_deref().unwrap_or("default"),
            "Printed page"
        );
        Ok(())
    }

    /// Write a heap snapshot of the page to `path`.
    pub async fn take_heap_snapshot(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let engine = self.engine()?;
        let snapshot = self
            .bounded("takeHeapSnapshot", engine.heap_snapshot())
            .await?;
        tokio::fs::write(path, &snapshot)
            .await
            .map_err(|source| HostError::IoFailure {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(content_id = %self.inner.id, path = %path.display(), "Wrote heap snapshot");
        Ok(())
    }

    /// Copy the image at the content-relative point to the clipboard.
    /// Resolves to false when there is no image there.
    pub async fn copy_image_at(&self, x: i32, y: i32) -> Result<bool, HostError> {
        let engine = self.engine()?;
        let Some(image) = self.bounded("copyImageAt", engine.image_at(x, y)).await? else {
            debug!(content_id = %self.inner.id, x, y, "No image to copy");
            return Ok(false);
        };
        let clipboard = self.inner.bridge.clipboard()?;
        clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_image(&image, ClipboardType::Clipboard)?;
        Ok(true)
    }

    pub async fn save_page(&self, path: impl AsRef<Path>, save_type: SaveType) -> Result<(), HostError> {
        let path = path.as_ref();
        let engine = self.engine()?;
        let bytes = self
            .bounded("savePage", async {
                settled(engine).await;
                engine.serialize_page(save_type).await
            })
            .await?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| HostError::IoFailure {
                path: path.to_path_buf(),
                source,
            })?;
        info!(content_id = %self.inner.id, path = %path.display(), ?save_type, "Saved page");
        Ok(())
    }

    /// Returns the key for [`ContentHandle::remove_inserted_css`].
    pub async fn insert_css(&self, css: &str, origin: CssOrigin) -> Result<String, HostError> {
        let engine = self.engine()?;
        let key = {
            let mut state = self.state()?;
            let key = format!("css-{}-{}", self.inner.id, state.next_css_key);
            state.next_css_key += 1;
            key
        };
        engine.insert_css(&key, css, origin).await?;
        self.state()?.css_keys.push(key.clone());
        Ok(key)
    }

    /// Unknown keys are ignored.
    pub async fn remove_inserted_css(&self, key: &str) -> Result<(), HostError> {
        let engine = self.engine()?;
        let known = {
            let mut state = self.state()?;
            let before = state.css_keys.len();
            state.css_keys.retain(|k| k != key);
            state.css_keys.len() != before
        };
        if !known {
            debug!(content_id = %self.inner.id, key, "Removing unknown CSS key");
            return Ok(());
        }
        engine.remove_css(key).await?;
        Ok(())
    }

    pub async fn insert_text(&self, text: &str) -> Result<(), HostError> {
        self.engine()?.insert_text(text).await?;
        Ok(())
    }

    /// Search the page. Repeating the current term with `find_next` steps
    /// the active match; any other request starts a new session.
    pub async fn find_in_page(&self, text: &str, options: FindOptions) -> Result<FindResult, HostError> {
        let engine = self.engine()?;
        let request_id = self.inner.next_find_request.fetch_add(1, Ordering::Relaxed);
        if text.is_empty() {
            self.stop_find_in_page(StopFindAction::ClearSelection)?;
            return Ok(FindResult {
                request_id,
                matches: 0,
                active_match_ordinal: 0,
            });
        }

        let matches = self
            .bounded("findInPage", async {
                settled(engine).await;
                engine.count_matches(text, options.match_case).await
            })
            .await?;

        let (matches, active) = {
            let mut state = self.state()?;
            let session = match state.find.take() {
                Some(mut session) if session.continues(text, &options) => {
                    session.advance(matches, options.forward);
                    session
                }
                previous => {
                    if let Some(stale) = previous {
                        warn!(
                            content_id = %self.inner.id,
                            previous = %stale.text,
                            "Starting a new search while highlights from the last one are active; \
                             call stop_find_in_page first"
                        );
                    }
                    FindSession::start(text, options.match_case, matches, options.forward)
                }
            };
            let current = (session.matches, session.active);
            state.find = Some(session);
            current
        };

        engine.apply(EngineSetting::FindHighlight {
            text: text.to_string(),
            active_match_ordinal: active,
        });
        debug!(content_id = %self.inner.id, request_id, matches, active, "Find in page");
        Ok(FindResult {
            request_id,
            matches,
            active_match_ordinal: active,
        })
    }

    /// End the find session and release its highlights.
    pub fn stop_find_in_page(&self, action: StopFindAction) -> Result<(), HostError> {
        let had_session = self.state()?.find.take().is_some();
        if had_session {
            self.inner.engine.apply(EngineSetting::StopFind(action));
        }
        Ok(())
    }

    /// Whether a find session is holding highlights.
    pub fn is_finding(&self) -> Result<bool, HostError> {
        Ok(self.state()?.find.is_some())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, HostError> {
        let timeout = self.inner.render_timeout;
        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result.map_err(HostError::from),
            Err(_) => {
                warn!(content_id = %self.inner.id, operation, ?timeout, "Operation timed out");
                Err(HostError::RenderTimeout { operation, timeout })
            }
        }
    }
}

/// Counts an operation as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Resolves once the document has finished loading.
async fn settled(engine: &dyn ContentEngine) {
    while !engine.load_state().is_settled() {
        tokio::time::sleep(SETTLE_POLL).await;
    }
}
