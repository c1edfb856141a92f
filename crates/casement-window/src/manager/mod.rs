//! The WindowManager owns every live window, the stacking order, focus and
//! the event bus observers subscribe to.

mod stacking;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use casement_common::{
    Color, ContentId, EventBus, HostError, IdAllocator, Rect, Size, WindowEvent, WindowId,
    WindowState,
};
use casement_config::HostConfig;
use casement_ipc::Router;
use casement_webview::{ContentHandle, EngineFactory, SharedClipboard, SpawnOptions};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::options::WindowOptions;
use crate::window::{Window, WindowData};
use stacking::Stacking;

const EVENT_CAPACITY: usize = 256;

pub(crate) struct Shared {
    pub(crate) config: HostConfig,
    router: Router,
    factory: Arc<dyn EngineFactory>,
    clipboard: Mutex<Option<SharedClipboard>>,
    events: EventBus,
    window_ids: IdAllocator,
    content_ids: IdAllocator,
    windows: Mutex<BTreeMap<WindowId, Window>>,
    stacking: Mutex<Stacking>,
}

impl Shared {
    pub(crate) fn publish(&self, event: WindowEvent) {
        debug!(?event, "Window event");
        self.events.publish(event);
    }

    fn windows(&self) -> MutexGuard<'_, BTreeMap<WindowId, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stacking(&self) -> MutexGuard<'_, Stacking> {
        self.stacking.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn window(&self, id: WindowId) -> Option<Window> {
        self.windows().get(&id).cloned()
    }

    /// Give `id` focus and raise it. Returns the window that lost focus.
    pub(crate) fn focus(&self, id: WindowId) -> Option<Window> {
        let previous = self.stacking().focus(id);
        previous.and_then(|prev| self.window(prev))
    }

    pub(crate) fn blur(&self, id: WindowId) -> bool {
        self.stacking().blur(id)
    }

    pub(crate) fn raise(&self, id: WindowId) {
        self.stacking().raise(id);
    }

    pub(crate) fn set_on_top(&self, id: WindowId, on_top: bool) {
        self.stacking().set_on_top(id, on_top);
    }

    /// Remove `id` from the table and tear it down. Unknown ids are a no-op.
    pub(crate) fn destroy(&self, id: WindowId) {
        let removed = self.windows().remove(&id);
        self.stacking().remove(id);
        if let Some(window) = removed {
            window.teardown();
        }
    }
}

/// Creates and tracks windows.
///
/// Cloning is cheap; clones share the same window table.
#[derive(Clone)]
pub struct WindowManager {
    shared: Arc<Shared>,
}

impl WindowManager {
    /// Must be called inside a tokio runtime; the IPC router spawns its
    /// pumps there.
    pub fn new(config: HostConfig, factory: Arc<dyn EngineFactory>) -> Result<Self, HostError> {
        let router = Router::new(config.ipc.queue_warn_depth)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                router,
                factory,
                clipboard: Mutex::new(None),
                events: EventBus::new(EVENT_CAPACITY),
                window_ids: IdAllocator::new(),
                content_ids: IdAllocator::new(),
                windows: Mutex::new(BTreeMap::new()),
                stacking: Mutex::new(Stacking::default()),
            }),
        })
    }

    /// Clipboard handed to the capability bridge of windows created from
    /// now on.
    pub fn set_clipboard(&self, clipboard: SharedClipboard) {
        *self
            .shared
            .clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(clipboard);
    }

    pub fn config(&self) -> &HostConfig {
        &self.shared.config
    }

    pub fn router(&self) -> &Router {
        &self.shared.router
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.shared.events.subscribe()
    }

    pub fn create(&self, options: WindowOptions) -> Result<Window, HostError> {
        let config = &self.shared.config;
        let defaults = config.window.default_size();
        let requested = Size::new(
            options.width.unwrap_or(defaults.width),
            options.height.unwrap_or(defaults.height),
        );
        if requested.width <= 0 || requested.height <= 0 {
            return Err(HostError::InvalidGeometry(format!(
                "window size must be positive, got {}x{}",
                requested.width, requested.height
            )));
        }

        let min_size = Size::new(options.min_width, options.min_height);
        let max_size = Size::new(options.max_width, options.max_height);
        crate::window::check_constraints(min_size, max_size)?;
        let size = crate::window::clamp_size(requested, min_size, max_size);

        let work_area = config.display.work_area();
        let normal_bounds = match (options.center, options.x, options.y) {
            (false, Some(x), Some(y)) => Rect::new(x, y, size.width, size.height),
            _ => Rect::centered_in(work_area, size),
        };

        let mut flags = options.flags();
        let state = if options.kiosk {
            WindowState::FullScreen
        } else if options.fullscreen && flags.fullscreenable {
            WindowState::FullScreen
        } else {
            if options.fullscreen {
                warn!("Ignoring fullscreen for a window that is not fullscreenable");
            }
            WindowState::Normal
        };
        if options.kiosk {
            flags.kiosk = true;
        }
        let bounds = match state {
            WindowState::FullScreen => config.display.bounds(),
            _ => normal_bounds,
        };

        let background_color = match options.background_color.as_deref() {
            Some(hex) => Color::from_hex(hex).unwrap_or_else(|| {
                warn!(color = hex, "Invalid background colour, using configured default");
                self.default_background()
            }),
            None => self.default_background(),
        };

        let window_id = self
            .shared
            .window_ids
            .allocate()
            .map(WindowId)
            .ok_or_else(|| HostError::Runtime("window id space exhausted".into()))?;
        let content_id = self
            .shared
            .content_ids
            .allocate()
            .map(ContentId)
            .ok_or_else(|| HostError::Runtime("content id space exhausted".into()))?;

        let titlebar_height = i32::try_from(config.window.titlebar_height).unwrap_or(i32::MAX);
        let content_size =
            crate::window::content_rect(bounds, options.frame, titlebar_height).size();
        let clipboard = self
            .shared
            .clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let content = ContentHandle::spawn(
            content_id,
            &self.shared.router,
            self.shared.factory.as_ref(),
            SpawnOptions {
                preferences: options.web_preferences.resolve(&config.content),
                size: content_size,
                render_timeout: config.content.render_timeout(),
                clipboard,
            },
        )?;
        content.set_background_color(background_color)?;

        let data = WindowData {
            state,
            bounds,
            normal_bounds,
            min_size,
            max_size,
            flags,
            visible: false,
            focused: false,
            flashing: false,
            skip_taskbar: options.skip_taskbar,
            frame: options.frame,
            title: options.title,
            background_color,
            aspect_ratio: 0.0,
        };
        let window = Window::new(
            window_id,
            content,
            Arc::downgrade(&self.shared),
            titlebar_height,
            config.display.clone(),
            data,
        );

        self.shared.windows().insert(window_id, window.clone());
        self.shared
            .stacking()
            .insert(window_id, flags.always_on_top);
        info!(window_id = %window_id, content_id = %content_id, ?state, "Window created");
        self.shared.publish(WindowEvent::Created {
            window_id,
            content_id,
        });

        if options.show.unwrap_or(config.window.show_on_create) {
            window.show()?;
        }
        Ok(window)
    }

    /// Destroy a window and its content process. Unknown or already
    /// destroyed ids are a no-op.
    pub fn destroy(&self, id: WindowId) {
        self.shared.destroy(id);
    }

    pub fn destroy_all(&self) {
        let ids: Vec<WindowId> = self.shared.windows().keys().copied().collect();
        for id in ids {
            self.shared.destroy(id);
        }
    }

    pub fn get(&self, id: WindowId) -> Option<Window> {
        self.shared.window(id)
    }

    /// Live windows in id order.
    pub fn all(&self) -> Vec<Window> {
        self.shared.windows().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.shared.windows().len()
    }

    pub fn focused(&self) -> Option<Window> {
        let id = self.shared.stacking().focused()?;
        self.shared.window(id)
    }

    /// Window ids front to back.
    pub fn z_order(&self) -> Vec<WindowId> {
        self.shared.stacking().front_to_back()
    }

    /// The window hosting content process `id`.
    pub fn from_content(&self, id: ContentId) -> Option<Window> {
        self.shared
            .windows()
            .values()
            .find(|w| w.content_id() == id)
            .cloned()
    }

    fn default_background(&self) -> Color {
        Color::from_hex(&self.shared.config.window.background_color).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;
