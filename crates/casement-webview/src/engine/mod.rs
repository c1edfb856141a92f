//! The rendering-engine seam.
//!
//! A content handle never renders anything itself. Every cross-process
//! request goes through [`ContentEngine`]: async methods for operations
//! that settle later (scripting, capture, print, serialize, find), plain
//! methods for fire-and-forget settings and input.

pub mod headless;
mod pdf;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use casement_common::{Color, ContentId, HostError, Size};
use casement_platform::NativeImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::handle::StopFindAction;
use crate::preferences::WebRtcIpHandlingPolicy;
use crate::state::{DevToolsState, LoadState};

/// Failure reported by an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Page script threw. Carries the exception description.
    Script(String),
    /// The engine itself failed.
    Host(String),
}

impl From<EngineError> for HostError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Script(description) => HostError::ExecutionError { description },
            EngineError::Host(msg) => HostError::EngineFailure(msg),
        }
    }
}

/// How a page is serialized by `save_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveType {
    /// Only the document markup.
    HtmlOnly,
    /// Markup with inserted styles inlined.
    #[default]
    HtmlComplete,
    /// Single-file MIME archive.
    Mhtml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssOrigin {
    #[default]
    Author,
    User,
}

/// Page setup for `print_to_pdf`. Sizes are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintOptions {
    pub landscape: bool,
    pub print_background: bool,
    pub page_width: f64,
    pub page_height: f64,
    pub scale: f64,
}

impl Default for PrintOptions {
    fn default() -> Self {
        // US Letter.
        Self {
            landscape: false,
            print_background: false,
            page_width: 612.0,
            page_height: 792.0,
            scale: 1.0,
        }
    }
}

impl PrintOptions {
    /// Page size after orientation is applied.
    pub fn page_size(&self) -> (f64, f64) {
        if self.landscape {
            (self.page_height, self.page_width)
        } else {
            (self.page_width, self.page_height)
        }
    }
}

/// A printer reachable from the content process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_default: bool,
}

/// Settings for printing to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintSettings {
    /// Skip the print dialog.
    pub silent: bool,
    pub print_background: bool,
    /// Printer to use. `None` picks the default printer.
    pub device_name: Option<String>,
    pub copies: u32,
    pub landscape: bool,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            silent: false,
            print_background: false,
            device_name: None,
            copies: 1,
            landscape: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Synthetic input delivered to the page. Coordinates are relative to the
/// content area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    MouseDown {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
    },
    MouseUp {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
    },
    MouseMove {
        x: i32,
        y: i32,
    },
    #[serde(rename_all = "camelCase")]
    MouseWheel {
        x: i32,
        y: i32,
        delta_x: f64,
        delta_y: f64,
    },
    #[serde(rename_all = "camelCase")]
    KeyDown { key_code: String },
    #[serde(rename_all = "camelCase")]
    KeyUp { key_code: String },
    /// Text input; the key code is the inserted text.
    #[serde(rename_all = "camelCase")]
    Char { key_code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenPosition {
    #[default]
    Desktop,
    Mobile,
}

/// Screen and viewport the page is made to believe it runs on. Zero sizes
/// and a zero device scale factor keep the real values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceEmulation {
    pub screen_position: ScreenPosition,
    pub screen_size: Size,
    pub view_size: Size,
    pub device_scale_factor: f64,
    pub scale: f64,
}

impl Default for DeviceEmulation {
    fn default() -> Self {
        Self {
            screen_position: ScreenPosition::Desktop,
            screen_size: Size::UNBOUNDED,
            view_size: Size::UNBOUNDED,
            device_scale_factor: 0.0,
            scale: 1.0,
        }
    }
}

impl DeviceEmulation {
    pub fn validate(&self) -> Result<(), HostError> {
        let sizes = [self.screen_size, self.view_size];
        if sizes.iter().any(|s| s.width < 0 || s.height < 0) {
            return Err(HostError::InvalidGeometry(format!(
                "emulated sizes must not be negative: screen {}x{}, view {}x{}",
                self.screen_size.width,
                self.screen_size.height,
                self.view_size.width,
                self.view_size.height
            )));
        }
        if !(self.device_scale_factor.is_finite() && self.device_scale_factor >= 0.0) {
            return Err(HostError::InvalidGeometry(format!(
                "device scale factor must be a non-negative number, got {}",
                self.device_scale_factor
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(HostError::InvalidGeometry(format!(
                "emulation scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Editing commands forwarded to the focused frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    PasteAndMatchStyle,
    Delete,
    SelectAll,
    Unselect,
    Replace(String),
    ReplaceMisspelling(String),
}

/// Fire-and-forget settings pushed from the handle to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSetting {
    AudioMuted(bool),
    ZoomFactor(f64),
    UserAgent(String),
    FrameRate(u32),
    BackgroundThrottling(bool),
    WebRtcIpHandlingPolicy(WebRtcIpHandlingPolicy),
    Painting(bool),
    Invalidate,
    Resize(Size),
    BackgroundColor(Color),
    Focus(bool),
    DevTools(DevToolsState),
    FindHighlight { text: String, active_match_ordinal: usize },
    StopFind(StopFindAction),
    /// `None` restores the real screen.
    DeviceEmulation(Option<DeviceEmulation>),
    IgnoreMenuShortcuts(bool),
}

/// Everything an engine needs to start a content process.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub size: Size,
    pub user_agent: String,
    pub zoom_factor: f64,
    pub frame_rate: u32,
    pub offscreen: bool,
    pub preload: Option<PathBuf>,
    /// Scripts to run before any page script, in order.
    pub init_scripts: Vec<String>,
    /// Raw JSON posted by the page through the bridge shim.
    pub bridge_tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
pub trait ContentEngine: Send + Sync {
    async fn execute_javascript(&self, code: &str, user_gesture: bool)
        -> Result<Value, EngineError>;

    /// Current frame, or `None` when nothing has been rendered.
    async fn capture(&self) -> Result<Option<NativeImage>, EngineError>;

    async fn print_to_pdf(&self, options: &PrintOptions) -> Result<Vec<u8>, EngineError>;

    async fn serialize_page(&self, save_type: SaveType) -> Result<Vec<u8>, EngineError>;

    async fn insert_css(&self, key: &str, css: &str, origin: CssOrigin)
        -> Result<(), EngineError>;

    async fn remove_css(&self, key: &str) -> Result<(), EngineError>;

    async fn insert_text(&self, text: &str) -> Result<(), EngineError>;

    /// Number of occurrences of `text` in the rendered document.
    async fn count_matches(&self, text: &str, match_case: bool) -> Result<usize, EngineError>;

    /// Send the page to a printer.
    async fn print(&self, settings: &PrintSettings) -> Result<(), EngineError>;

    /// Serialized heap snapshot of the page's script context.
    async fn heap_snapshot(&self) -> Result<Vec<u8>, EngineError>;

    /// The image under the content-relative point, if there is one.
    async fn image_at(&self, x: i32, y: i32) -> Result<Option<NativeImage>, EngineError>;

    fn printers(&self) -> Vec<PrinterInfo>;

    fn send_input_event(&self, event: InputEvent);

    /// The main resource has been requested but nothing has come back yet.
    fn is_waiting_for_response(&self) -> bool;

    fn load_url(&self, url: &str);

    fn reload(&self);

    fn edit(&self, command: EditCommand);

    fn apply(&self, setting: EngineSetting);

    fn url(&self) -> String;

    fn title(&self) -> String;

    fn load_state(&self) -> LoadState;

    fn is_audible(&self) -> bool;

    fn is_crashed(&self) -> bool;

    fn os_process_id(&self) -> u32;

    /// Tear the process down. Called once, when the handle is destroyed.
    fn shutdown(&self);
}

/// Starts engines for new content processes.
pub trait EngineFactory: Send + Sync {
    fn spawn(&self, id: ContentId, spec: EngineSpec) -> Result<Arc<dyn ContentEngine>, HostError>;
}
