//! Content processes: the handle the controller holds for each isolated
//! rendering context, the engine seam it drives, and the capability bridge
//! exposed into the page.
//!
//! - [`ContentHandle`]: lifecycle queries, scripting, capture, print/save,
//!   find-in-page, input and fire-and-forget settings for one content process
//! - [`ContentEngine`]: what a rendering engine must provide; the host's
//!   real engine plugs in here
//! - [`HeadlessEngine`]: deterministic in-process engine for tests and the CLI
//! - [`CapabilityBridge`]: the finite set of controller operations a page
//!   may call

pub mod bridge;
pub mod engine;
pub mod handle;
pub mod preferences;
pub mod state;

pub use bridge::{js_settle, BridgeCall, BridgeReply, Capability, CapabilityBridge, SharedClipboard};
pub use engine::headless::{HeadlessEngine, HeadlessFactory, PrintJob};
pub use engine::{
    ContentEngine, CssOrigin, DeviceEmulation, EditCommand, EngineError, EngineFactory,
    EngineSetting, EngineSpec, InputEvent, MouseButton, PrintOptions, PrintSettings, PrinterInfo,
    SaveType, ScreenPosition,
};
pub use handle::{
    ContentHandle, DevToolsOptions, FindOptions, FindResult, SpawnOptions, StopFindAction,
};
pub use preferences::{ResolvedPreferences, WebPreferences, WebRtcIpHandlingPolicy};
pub use state::{AudioState, DevToolsState, LoadState};
