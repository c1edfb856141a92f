//! Controller-side handle to one content process.
//!
//! The handle owns the process's engine, IPC endpoint and capability
//! bridge. Settings are pushed to the engine immediately and mirrored
//! here so getters answer without a round trip. After [`ContentHandle::destroy`]
//! every operation except `id`, `is_destroyed` and `destroy` fails with
//! [`HostError::HandleDestroyed`].

mod find;
mod ops;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use casement_common::{Color, ContentId, HostError, Size, CONTROLLER_SENDER_ID};
use casement_ipc::{IpcEndpoint, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::{CapabilityBridge, SharedClipboard};
use crate::engine::{
    ContentEngine, DeviceEmulation, EditCommand, EngineFactory, EngineSetting, EngineSpec,
    InputEvent, PrinterInfo,
};
use crate::preferences::{clamp_frame_rate, ResolvedPreferences, WebRtcIpHandlingPolicy};
use crate::state::{AudioState, DevToolsState, LoadState};

pub use find::{FindOptions, FindResult, StopFindAction};
use find::FindSession;

/// Everything needed to start a content process besides its id.
pub struct SpawnOptions {
    pub preferences: ResolvedPreferences,
    pub size: Size,
    pub render_timeout: Duration,
    pub clipboard: Option<SharedClipboard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevToolsOptions {
    /// Give the devtools window focus when it opens.
    pub activate: bool,
}

#[derive(Debug)]
struct HandleState {
    muted: bool,
    zoom_factor: f64,
    user_agent: String,
    frame_rate: u32,
    background_throttling: bool,
    webrtc_policy: WebRtcIpHandlingPolicy,
    painting: bool,
    offscreen: bool,
    focused: bool,
    devtools_allowed: bool,
    devtools: DevToolsState,
    preload: Option<PathBuf>,
    find: Option<FindSession>,
    css_keys: Vec<String>,
    next_css_key: u64,
    emulation: Option<DeviceEmulation>,
    ignore_menu_shortcuts: bool,
}

struct HandleInner {
    id: ContentId,
    engine: Arc<dyn ContentEngine>,
    endpoint: IpcEndpoint,
    bridge: Arc<CapabilityBridge>,
    render_timeout: Duration,
    destroyed: AtomicBool,
    next_find_request: AtomicU32,
    /// Captures in flight.
    captures: AtomicUsize,
    state: Mutex<HandleState>,
    bridge_task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct ContentHandle {
    inner: Arc<HandleInner>,
}

impl ContentHandle {
    /// Register the process's mailbox, start its engine and the task that
    /// serves bridge calls from the page.
    pub fn spawn(
        id: ContentId,
        router: &Router,
        factory: &dyn EngineFactory,
        options: SpawnOptions,
    ) -> Result<Self, HostError> {
        let SpawnOptions {
            preferences: prefs,
            size,
            render_timeout,
            clipboard,
        } = options;

        let endpoint = router.register(id.0);
        let mut bridge = CapabilityBridge::new(prefs.capabilities.clone(), endpoint.clone());
        if let Some(clipboard) = clipboard {
            bridge = bridge.with_clipboard(clipboard);
        }
        let bridge = Arc::new(bridge);

        let (bridge_tx, bridge_rx) = mpsc::unbounded_channel();
        let spec = EngineSpec {
            size,
            user_agent: prefs.user_agent.clone(),
            zoom_factor: prefs.zoom_factor,
            frame_rate: prefs.frame_rate,
            offscreen: prefs.offscreen,
            preload: prefs.preload.clone(),
            init_scripts: vec![bridge.init_script()],
            bridge_tx,
        };
        let engine = match factory.spawn(id, spec) {
            Ok(engine) => engine,
            Err(e) => {
                router.unregister(id.0);
                return Err(e);
            }
        };
        engine.apply(EngineSetting::BackgroundThrottling(prefs.background_throttling));
        engine.apply(EngineSetting::WebRtcIpHandlingPolicy(prefs.webrtc_policy));

        let bridge_task = router.runtime().spawn(serve_bridge(
            bridge_rx,
            Arc::clone(&bridge),
            Arc::downgrade(&engine),
        ));

        info!(
            content_id = %id,
            pid = engine.os_process_id(),
            capabilities = ?bridge.exposed(),
            "Content process started"
        );

        Ok(Self {
            inner: Arc::new(HandleInner {
                id,
                engine,
                endpoint,
                bridge,
                render_timeout,
                destroyed: AtomicBool::new(false),
                next_find_request: AtomicU32::new(1),
                captures: AtomicUsize::new(0),
                state: Mutex::new(HandleState {
                    muted: false,
                    zoom_factor: prefs.zoom_factor,
                    user_agent: prefs.user_agent,
                    frame_rate: prefs.frame_rate,
                    background_throttling: prefs.background_throttling,
                    webrtc_policy: prefs.webrtc_policy,
                    painting: true,
                    offscreen: prefs.offscreen,
                    focused: false,
                    devtools_allowed: prefs.dev_tools,
                    devtools: DevToolsState::Closed,
                    preload: prefs.preload,
                    find: None,
                    css_keys: Vec::new(),
                    next_css_key: 1,
                    emulation: None,
                    ignore_menu_shortcuts: false,
                }),
                bridge_task: Mutex::new(Some(bridge_task)),
            }),
        })
    }

    pub fn id(&self) -> ContentId {
        self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Close the mailbox and shut the engine down. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.endpoint.router().unregister(self.inner.id.0);
        if let Some(task) = self
            .inner
            .bridge_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.inner.engine.shutdown();
        info!(content_id = %self.inner.id, "Content process destroyed");
    }

    fn live(&self) -> Result<(), HostError> {
        if self.is_destroyed() {
            return Err(HostError::HandleDestroyed(self.inner.id));
        }
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, HandleState>, HostError> {
        self.live()?;
        Ok(self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn engine(&self) -> Result<&dyn ContentEngine, HostError> {
        self.live()?;
        Ok(self.inner.engine.as_ref())
    }

    // -- IPC --

    /// This process's IPC endpoint.
    pub fn ipc(&self) -> Result<IpcEndpoint, HostError> {
        self.live()?;
        Ok(self.inner.endpoint.clone())
    }

    /// Send from the controller to this process.
    pub fn send(&self, channel: &str, args: Vec<Value>) -> Result<(), HostError> {
        self.live()?;
        self.inner
            .endpoint
            .router()
            .send(CONTROLLER_SENDER_ID, self.inner.id.0, channel, args);
        Ok(())
    }

    pub fn bridge(&self) -> Result<&CapabilityBridge, HostError> {
        self.live()?;
        Ok(&self.inner.bridge)
    }

    // -- Audio --

    pub fn set_audio_muted(&self, muted: bool) -> Result<(), HostError> {
        self.state()?.muted = muted;
        self.inner.engine.apply(EngineSetting::AudioMuted(muted));
        Ok(())
    }

    pub fn is_audio_muted(&self) -> Result<bool, HostError> {
        Ok(self.state()?.muted)
    }

    pub fn audio_state(&self) -> Result<AudioState, HostError> {
        let muted = self.state()?.muted;
        Ok(AudioState {
            muted,
            audible: self.inner.engine.is_audible(),
        })
    }

    /// Audio is playing and not muted.
    pub fn is_currently_audible(&self) -> Result<bool, HostError> {
        Ok(self.audio_state()?.is_heard())
    }

    // -- Rendering settings --

    pub fn set_zoom_factor(&self, factor: f64) -> Result<(), HostError> {
        let mut state = self.state()?;
        if !(factor.is_finite() && factor > 0.0) {
            warn!(content_id = %self.inner.id, factor, "Ignoring non-positive zoom factor");
            return Ok(());
        }
        state.zoom_factor = factor;
        drop(state);
        self.inner.engine.apply(EngineSetting::ZoomFactor(factor));
        Ok(())
    }

    pub fn zoom_factor(&self) -> Result<f64, HostError> {
        Ok(self.state()?.zoom_factor)
    }

    pub fn set_user_agent(&self, user_agent: &str) -> Result<(), HostError> {
        self.state()?.user_agent = user_agent.to_string();
        self.inner
            .engine
            .apply(EngineSetting::UserAgent(user_agent.to_string()));
        Ok(())
    }

    pub fn user_agent(&self) -> Result<String, HostError> {
        Ok(self.state()?.user_agent.clone())
    }

    /// Clamped to 1-240.
    pub fn set_frame_rate(&self, fps: u32) -> Result<(), HostError> {
        let fps = clamp_frame_rate(f64::from(fps));
        self.state()?.frame_rate = fps;
        self.inner.engine.apply(EngineSetting::FrameRate(fps));
        Ok(())
    }

    pub fn frame_rate(&self) -> Result<u32, HostError> {
        Ok(self.state()?.frame_rate)
    }

    pub fn set_background_throttling(&self, allowed: bool) -> Result<(), HostError> {
        self.state()?.background_throttling = allowed;
        self.inner
            .engine
            .apply(EngineSetting::BackgroundThrottling(allowed));
        Ok(())
    }

    pub fn background_throttling(&self) -> Result<bool, HostError> {
        Ok(self.state()?.background_throttling)
    }

    pub fn set_web_rtc_ip_handling_policy(
        &self,
        policy: WebRtcIpHandlingPolicy,
    ) -> Result<(), HostError> {
        self.state()?.webrtc_policy = policy;
        self.inner
            .engine
            .apply(EngineSetting::WebRtcIpHandlingPolicy(policy));
        Ok(())
    }

    pub fn web_rtc_ip_handling_policy(&self) -> Result<WebRtcIpHandlingPolicy, HostError> {
        Ok(self.state()?.webrtc_policy)
    }

    pub fn start_painting(&self) -> Result<(), HostError> {
        self.set_painting(true)
    }

    pub fn stop_painting(&self) -> Result<(), HostError> {
        self.set_painting(false)
    }

    fn set_painting(&self, painting: bool) -> Result<(), HostError> {
        self.state()?.painting = painting;
        self.inner.engine.apply(EngineSetting::Painting(painting));
        Ok(())
    }

    pub fn is_painting(&self) -> Result<bool, HostError> {
        Ok(self.state()?.painting)
    }

    /// Schedule a full repaint.
    pub fn invalidate(&self) -> Result<(), HostError> {
        self.engine()?.apply(EngineSetting::Invalidate);
        Ok(())
    }

    pub fn is_offscreen(&self) -> Result<bool, HostError> {
        Ok(self.state()?.offscreen)
    }

    pub fn preload(&self) -> Result<Option<PathBuf>, HostError> {
        Ok(self.state()?.preload.clone())
    }

    /// New viewport size, pushed by the owning window.
    pub fn resize(&self, size: Size) -> Result<(), HostError> {
        self.engine()?.apply(EngineSetting::Resize(size));
        Ok(())
    }

    pub fn set_background_color(&self, color: Color) -> Result<(), HostError> {
        self.engine()?.apply(EngineSetting::BackgroundColor(color));
        Ok(())
    }

    /// Make the page see the screen and viewport in `emulation`.
    pub fn enable_device_emulation(&self, emulation: DeviceEmulation) -> Result<(), HostError> {
        emulation.validate()?;
        self.state()?.emulation = Some(emulation);
        debug!(content_id = %self.inner.id, ?emulation, "Device emulation enabled");
        self.inner
            .engine
            .apply(EngineSetting::DeviceEmulation(Some(emulation)));
        Ok(())
    }

    pub fn disable_device_emulation(&self) -> Result<(), HostError> {
        if self.state()?.emulation.take().is_some() {
            self.inner.engine.apply(EngineSetting::DeviceEmulation(None));
        }
        Ok(())
    }

    pub fn device_emulation(&self) -> Result<Option<DeviceEmulation>, HostError> {
        Ok(self.state()?.emulation)
    }

    /// Whether a `capture_page` is in flight.
    pub fn is_being_captured(&self) -> Result<bool, HostError> {
        self.live()?;
        Ok(self.inner.captures.load(Ordering::Acquire) > 0)
    }

    // -- Input --

    pub fn send_input_event(&self, event: InputEvent) -> Result<(), HostError> {
        self.engine()?.send_input_event(event);
        Ok(())
    }

    /// Keep menu accelerators from firing while this page has focus.
    pub fn set_ignore_menu_shortcuts(&self, ignore: bool) -> Result<(), HostError> {
        self.state()?.ignore_menu_shortcuts = ignore;
        self.inner
            .engine
            .apply(EngineSetting::IgnoreMenuShortcuts(ignore));
        Ok(())
    }

    pub fn is_ignoring_menu_shortcuts(&self) -> Result<bool, HostError> {
        Ok(self.state()?.ignore_menu_shortcuts)
    }

    // -- Focus --

    pub fn focus(&self) -> Result<(), HostError> {
        self.set_focused(true)
    }

    pub fn blur(&self) -> Result<(), HostError> {
        self.set_focused(false)
    }

    fn set_focused(&self, focused: bool) -> Result<(), HostError> {
        self.state()?.focused = focused;
        self.inner.engine.apply(EngineSetting::Focus(focused));
        Ok(())
    }

    pub fn is_focused(&self) -> Result<bool, HostError> {
        Ok(self.state()?.focused)
    }

    // -- Devtools --

    /// No-op when devtools are disabled by web preferences.
    pub fn open_dev_tools(&self, options: DevToolsOptions) -> Result<(), HostError> {
        let mut state = self.state()?;
        if !state.devtools_allowed {
            warn!(content_id = %self.inner.id, "Devtools are disabled for this content process");
            return Ok(());
        }
        let next = if options.activate {
            DevToolsState::OpenedAndFocused
        } else {
            DevToolsState::Opened
        };
        state.devtools = next;
        drop(state);
        self.inner.engine.apply(EngineSetting::DevTools(next));
        Ok(())
    }

    pub fn close_dev_tools(&self) -> Result<(), HostError> {
        let mut state = self.state()?;
        if state.devtools == DevToolsState::Closed {
            return Ok(());
        }
        state.devtools = DevToolsState::Closed;
        drop(state);
        self.inner
            .engine
            .apply(EngineSetting::DevTools(DevToolsState::Closed));
        Ok(())
    }

    pub fn toggle_dev_tools(&self) -> Result<(), HostError> {
        if self.is_dev_tools_opened()? {
            self.close_dev_tools()
        } else {
            self.open_dev_tools(DevToolsOptions { activate: true })
        }
    }

    pub fn dev_tools_state(&self) -> Result<DevToolsState, HostError> {
        Ok(self.state()?.devtools)
    }

    pub fn is_dev_tools_opened(&self) -> Result<bool, HostError> {
        Ok(self.dev_tools_state()? != DevToolsState::Closed)
    }

    pub fn is_dev_tools_focused(&self) -> Result<bool, HostError> {
        Ok(self.dev_tools_state()? == DevToolsState::OpenedAndFocused)
    }

    // -- Navigation --

    pub fn load_url(&self, url: &str) -> Result<(), HostError> {
        let engine = self.engine()?;
        self.state()?.find = None;
        debug!(content_id = %self.inner.id, url, "Loading URL");
        engine.load_url(url);
        Ok(())
    }

    pub fn reload(&self) -> Result<(), HostError> {
        self.engine()?.reload();
        Ok(())
    }

    pub fn url(&self) -> Result<String, HostError> {
        Ok(self.engine()?.url())
    }

    pub fn title(&self) -> Result<String, HostError> {
        Ok(self.engine()?.title())
    }

    pub fn load_state(&self) -> Result<LoadState, HostError> {
        Ok(self.engine()?.load_state())
    }

    pub fn is_loading(&self) -> Result<bool, HostError> {
        Ok(!self.load_state()?.is_settled())
    }

    pub fn is_loading_main_frame(&self) -> Result<bool, HostError> {
        Ok(self.load_state()? == LoadState::LoadingMainFrame)
    }

    pub fn is_waiting_for_response(&self) -> Result<bool, HostError> {
        Ok(self.engine()?.is_waiting_for_response())
    }

    pub fn get_printers(&self) -> Result<Vec<PrinterInfo>, HostError> {
        Ok(self.engine()?.printers())
    }

    pub fn is_crashed(&self) -> Result<bool, HostError> {
        Ok(self.engine()?.is_crashed())
    }

    pub fn process_id(&self) -> Result<u32, HostError> {
        Ok(self.engine()?.os_process_id())
    }

    // -- Editing --

    fn edit(&self, command: EditCommand) -> Result<(), HostError> {
        self.engine()?.edit(command);
        Ok(())
    }

    pub fn undo(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Undo)
    }

    pub fn redo(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Redo)
    }

    pub fn cut(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Cut)
    }

    pub fn copy(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Copy)
    }

    pub fn paste(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Paste)
    }

    pub fn paste_and_match_style(&self) -> Result<(), HostError> {
        self.edit(EditCommand::PasteAndMatchStyle)
    }

    pub fn delete(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Delete)
    }

    pub fn select_all(&self) -> Result<(), HostError> {
        self.edit(EditCommand::SelectAll)
    }

    pub fn unselect(&self) -> Result<(), HostError> {
        self.edit(EditCommand::Unselect)
    }

    pub fn replace(&self, text: &str) -> Result<(), HostError> {
        self.edit(EditCommand::Replace(text.to_string()))
    }

    pub fn replace_misspelling(&self, text: &str) -> Result<(), HostError> {
        self.edit(EditCommand::ReplaceMisspelling(text.to_string()))
    }
}

impl std::fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandle")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

/// Drain page posts for one process until its engine goes away.
async fn serve_bridge(
    mut rx: mpsc::UnboundedReceiver<String>,
    bridge: Arc<CapabilityBridge>,
    engine: Weak<dyn ContentEngine>,
) {
    while let Some(raw) = rx.recv().await {
        let Some(settle) = bridge.handle_post(&raw) else {
            continue;
        };
        let Some(engine) = engine.upgrade() else {
            break;
        };
        if let Err(e) = engine.execute_javascript(&settle, false).await {
            warn!(error = ?e, "Failed to settle bridge call in page");
        }
    }
}
