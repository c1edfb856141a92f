//! A top-level window and the content process it hosts.
//!
//! All mutable window state lives behind one mutex. Operations take the
//! lock, validate, mutate and collect the events they cause; events are
//! published after the lock is released. Every operation on a destroyed
//! window fails with [`HostError::InstanceDestroyed`] except `id`,
//! `is_destroyed` and `destroy`.

mod flags;
mod geometry;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use casement_common::{
    Color, ContentId, HostError, Rect, Size, WindowEvent, WindowId, WindowState,
};
use casement_config::DisplayConfig;
use casement_platform::NativeImage;
use casement_webview::ContentHandle;
use tracing::{debug, info, warn};

use crate::manager::Shared;
use crate::options::WindowFlags;

pub(crate) use geometry::{check_constraints, clamp_size, content_rect};

#[derive(Debug)]
pub(crate) struct WindowData {
    pub(crate) state: WindowState,
    pub(crate) bounds: Rect,
    /// Last geometry held in `Normal`; restored on return to it.
    pub(crate) normal_bounds: Rect,
    pub(crate) min_size: Size,
    pub(crate) max_size: Size,
    pub(crate) flags: WindowFlags,
    pub(crate) visible: bool,
    pub(crate) focused: bool,
    pub(crate) flashing: bool,
    pub(crate) skip_taskbar: bool,
    pub(crate) frame: bool,
    pub(crate) title: String,
    pub(crate) background_color: Color,
    /// Width / height of the content area; 0 when unconstrained.
    pub(crate) aspect_ratio: f64,
}

struct WindowInner {
    id: WindowId,
    content: ContentHandle,
    manager: Weak<Shared>,
    titlebar_height: i32,
    display: DisplayConfig,
    data: Mutex<WindowData>,
}

/// Cloneable handle to one window. Clones refer to the same window.
#[derive(Clone)]
pub struct Window {
    inner: Arc<WindowInner>,
}

impl Window {
    pub(crate) fn new(
        id: WindowId,
        content: ContentHandle,
        manager: Weak<Shared>,
        titlebar_height: i32,
        display: DisplayConfig,
        data: WindowData,
    ) -> Self {
        Self {
            inner: Arc::new(WindowInner {
                id,
                content,
                manager,
                titlebar_height,
                display,
                data: Mutex::new(data),
            }),
        }
    }

    pub fn id(&self) -> WindowId {
        self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().state == WindowState::Destroyed
    }

    /// Destroy the window and its content process. Idempotent.
    pub fn destroy(&self) {
        match self.inner.manager.upgrade() {
            Some(shared) => shared.destroy(self.inner.id),
            None => self.teardown(),
        }
    }

    /// Destroy the window if it is closable. Returns whether it closed.
    pub fn close(&self) -> Result<bool, HostError> {
        if !self.data()?.flags.closable {
            warn!(window_id = %self.inner.id, "Ignoring close on a non-closable window");
            return Ok(false);
        }
        self.destroy();
        Ok(true)
    }

    /// Mark destroyed, shut the content process down and announce it.
    pub(crate) fn teardown(&self) {
        let from = {
            let mut data = self.lock();
            if data.state == WindowState::Destroyed {
                return;
            }
            let from = data.state;
            data.state = WindowState::Destroyed;
            data.visible = false;
            data.focused = false;
            from
        };
        self.inner.content.destroy();
        info!(window_id = %self.inner.id, "Window destroyed");
        self.emit([
            WindowEvent::StateChanged {
                window_id: self.inner.id,
                from,
                to: WindowState::Destroyed,
            },
            WindowEvent::Destroyed {
                window_id: self.inner.id,
            },
        ]);
    }

    // -- Content --

    /// The content process hosted by this window.
    pub fn web_contents(&self) -> Result<ContentHandle, HostError> {
        self.data()?;
        Ok(self.inner.content.clone())
    }

    pub(crate) fn content_id(&self) -> ContentId {
        self.inner.content.id()
    }

    pub fn reload(&self) -> Result<(), HostError> {
        self.data()?;
        self.inner.content.reload()
    }

    pub fn focus_on_web_view(&self) -> Result<(), HostError> {
        self.data()?;
        self.inner.content.focus()
    }

    pub fn blur_web_view(&self) -> Result<(), HostError> {
        self.data()?;
        self.inner.content.blur()
    }

    /// Capture the content area, cropped to `rect` (content coordinates)
    /// when given.
    pub async fn capture_page(&self, rect: Option<Rect>) -> Result<NativeImage, HostError> {
        self.data()?;
        self.inner.content.capture_page(rect).await
    }

    // -- Internals shared by the operation modules --

    fn lock(&self) -> MutexGuard<'_, WindowData> {
        self.inner.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for an operation on a live window.
    fn data(&self) -> Result<MutexGuard<'_, WindowData>, HostError> {
        let data = self.lock();
        if data.state == WindowState::Destroyed {
            return Err(HostError::InstanceDestroyed(self.inner.id));
        }
        Ok(data)
    }

    fn manager(&self) -> Option<Arc<Shared>> {
        self.inner.manager.upgrade()
    }

    fn emit(&self, events: impl IntoIterator<Item = WindowEvent>) {
        let Some(shared) = self.manager() else {
            return;
        };
        for event in events {
            shared.publish(event);
        }
    }

    /// Move the window to `bounds`, resizing the content process. Pushes a
    /// `BoundsChanged` event when the geometry actually changed.
    fn commit_bounds(&self, data: &mut WindowData, bounds: Rect, events: &mut Vec<WindowEvent>) {
        if data.bounds == bounds {
            return;
        }
        data.bounds = bounds;
        let content = content_rect(bounds, data.frame, self.inner.titlebar_height);
        if let Err(e) = self.inner.content.resize(content.size()) {
            debug!(window_id = %self.inner.id, error = %e, "Content resize skipped");
        }
        events.push(WindowEvent::BoundsChanged {
            window_id: self.inner.id,
            bounds,
        });
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.lock();
        f.debug_struct("Window")
            .field("id", &self.inner.id)
            .field("state", &data.state)
            .field("bounds", &data.bounds)
            .finish_non_exhaustive()
    }
}
