//! Deterministic in-process engine.
//!
//! Holds an HTML document in memory and answers every engine request from
//! it. Script evaluation understands JSON literals, `throw <value>` and a
//! few document properties; anything else evaluates to `null`. An optional
//! artificial latency delays the slow operations so timeouts can be
//! exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use casement_common::{Color, ContentId, HostError, Size};
use casement_platform::NativeImage;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{
    pdf, ContentEngine, CssOrigin, DeviceEmulation, EditCommand, EngineError, EngineFactory,
    EngineSetting, EngineSpec, InputEvent, PrintOptions, PrintSettings, PrinterInfo, SaveType,
};
use crate::preferences::WebRtcIpHandlingPolicy;
use crate::state::{DevToolsState, LoadState};

const BLANK_URL: &str = "about:blank";
const DATA_HTML_PREFIX: &str = "data:text/html,";
const MHTML_BOUNDARY: &str = "----casement-mhtml";

/// A finished job on one of the headless printers.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintJob {
    pub printer: String,
    pub copies: u32,
    pub silent: bool,
    /// The job rendered as PDF.
    pub document: Vec<u8>,
}

/// The printer every headless engine starts with.
pub fn default_printers() -> Vec<PrinterInfo> {
    vec![PrinterInfo {
        name: "casement-pdf".into(),
        display_name: "Save as PDF".into(),
        description: "Headless PDF printer".into(),
        is_default: true,
    }]
}

#[derive(Debug)]
struct HeadlessState {
    url: String,
    document: String,
    load_state: LoadState,
    size: Size,
    background: Color,
    painting: bool,
    audible: bool,
    muted: bool,
    zoom_factor: f64,
    user_agent: String,
    frame_rate: u32,
    background_throttling: bool,
    webrtc_policy: WebRtcIpHandlingPolicy,
    focused: bool,
    devtools: DevToolsState,
    css: BTreeMap<String, (String, CssOrigin)>,
    edits: Vec<EditCommand>,
    scripts: Vec<String>,
    highlight: Option<(String, usize)>,
    emulation: Option<DeviceEmulation>,
    ignore_menu_shortcuts: bool,
    waiting_for_response: bool,
    inputs: Vec<InputEvent>,
    jobs: Vec<PrintJob>,
    reloads: u32,
    crashed: bool,
    shut_down: bool,
}

pub struct HeadlessEngine {
    state: Mutex<HeadlessState>,
    latency: Duration,
    pid: u32,
    printers: Vec<PrinterInfo>,
    init_scripts: Vec<String>,
    bridge_tx: Option<mpsc::UnboundedSender<String>>,
}

impl HeadlessEngine {
    pub fn new(size: Size) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                url: BLANK_URL.into(),
                document: blank_document(""),
                load_state: LoadState::Idle,
                size,
                background: Color::default(),
                painting: true,
                audible: false,
                muted: false,
                zoom_factor: 1.0,
                user_agent: String::new(),
                frame_rate: 60,
                background_throttling: true,
                webrtc_policy: WebRtcIpHandlingPolicy::default(),
                focused: false,
                devtools: DevToolsState::Closed,
                css: BTreeMap::new(),
                edits: Vec::new(),
                scripts: Vec::new(),
                highlight: None,
                emulation: None,
                ignore_menu_shortcuts: false,
                waiting_for_response: false,
                inputs: Vec::new(),
                jobs: Vec::new(),
                reloads: 0,
                crashed: false,
                shut_down: false,
            }),
            latency: Duration::ZERO,
            pid: std::process::id(),
            printers: default_printers(),
            init_scripts: Vec::new(),
            bridge_tx: None,
        }
    }

    pub fn from_spec(id: ContentId, spec: EngineSpec) -> Self {
        let mut engine = Self::new(spec.size);
        {
            let state = engine.state.get_mut().unwrap_or_else(PoisonError::into_inner);
            state.user_agent = spec.user_agent;
            state.zoom_factor = spec.zoom_factor;
            state.frame_rate = spec.frame_rate;
        }
        engine.pid = 10_000 + id.0;
        engine.init_scripts = spec.init_scripts;
        engine.bridge_tx = Some(spec.bridge_tx);
        engine
    }

    /// Delay capture, print and serialize by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_printers(mut self, printers: Vec<PrinterInfo>) -> Self {
        self.printers = printers;
        self
    }

    pub fn with_bridge(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.bridge_tx = Some(tx);
        self
    }

    /// Replace the document markup.
    pub fn set_document(&self, html: &str) {
        self.lock().document = html.to_string();
    }

    pub fn document(&self) -> String {
        self.lock().document.clone()
    }

    pub fn set_load_state(&self, load_state: LoadState) {
        self.lock().load_state = load_state;
    }

    /// Simulate a navigation whose main resource has not answered yet.
    pub fn set_waiting_for_response(&self, waiting: bool) {
        self.lock().waiting_for_response = waiting;
    }

    pub fn set_audible(&self, audible: bool) {
        self.lock().audible = audible;
    }

    /// Simulate the render process dying.
    pub fn crash(&self) {
        self.lock().crashed = true;
    }

    /// Simulate the page posting through the bridge shim. Returns false
    /// when nothing is listening.
    pub fn post_from_page(&self, raw: &str) -> bool {
        match &self.bridge_tx {
            Some(tx) => tx.send(raw.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn init_scripts(&self) -> &[String] {
        &self.init_scripts
    }

    pub fn edits(&self) -> Vec<EditCommand> {
        self.lock().edits.clone()
    }

    /// Every script evaluated so far, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn inserted_css(&self) -> Vec<String> {
        self.lock().css.values().map(|(css, _)| css.clone()).collect()
    }

    pub fn highlight(&self) -> Option<(String, usize)> {
        self.lock().highlight.clone()
    }

    /// Input events received so far, in order.
    pub fn inputs(&self) -> Vec<InputEvent> {
        self.lock().inputs.clone()
    }

    pub fn print_jobs(&self) -> Vec<PrintJob> {
        self.lock().jobs.clone()
    }

    pub fn emulation(&self) -> Option<DeviceEmulation> {
        self.lock().emulation
    }

    pub fn ignores_menu_shortcuts(&self) -> bool {
        self.lock().ignore_menu_shortcuts
    }

    pub fn zoom_factor(&self) -> f64 {
        self.lock().zoom_factor
    }

    pub fn user_agent(&self) -> String {
        self.lock().user_agent.clone()
    }

    pub fn frame_rate(&self) -> u32 {
        self.lock().frame_rate
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn is_painting(&self) -> bool {
        self.lock().painting
    }

    pub fn is_focused(&self) -> bool {
        self.lock().focused
    }

    pub fn background_throttling(&self) -> bool {
        self.lock().background_throttling
    }

    pub fn webrtc_policy(&self) -> WebRtcIpHandlingPolicy {
        self.lock().webrtc_policy
    }

    pub fn devtools(&self) -> DevToolsState {
        self.lock().devtools
    }

    pub fn size(&self) -> Size {
        self.lock().size
    }

    pub fn reloads(&self) -> u32 {
        self.lock().reloads
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for an operation that needs a live process.
    fn live(&self) -> Result<MutexGuard<'_, HeadlessState>, EngineError> {
        let state = self.lock();
        if state.shut_down {
            return Err(EngineError::Host("engine has shut down".into()));
        }
        if state.crashed {
            return Err(EngineError::Host("render process crashed".into()));
        }
        Ok(state)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ContentEngine for HeadlessEngine {
    async fn execute_javascript(
        &self,
        code: &str,
        user_gesture: bool,
    ) -> Result<Value, EngineError> {
        let mut state = self.live()?;
        debug!(user_gesture, len = code.len(), "Evaluating script");
        state.scripts.push(code.to_string());
        evaluate(code, &state)
    }

    async fn capture(&self) -> Result<Option<NativeImage>, EngineError> {
        self.delay().await;
        let state = self.live()?;
        Ok(frame(&state))
    }

    async fn print_to_pdf(&self, options: &PrintOptions) -> Result<Vec<u8>, EngineError> {
        self.delay().await;
        let state = self.live()?;
        Ok(render_pdf(&state.document, options))
    }

    async fn serialize_page(&self, save_type: SaveType) -> Result<Vec<u8>, EngineError> {
        self.delay().await;
        let state = self.live()?;
        let html = match save_type {
            SaveType::HtmlOnly => state.document.clone(),
            SaveType::HtmlComplete => with_styles(&state.document, &state.css),
            SaveType::Mhtml => format!(
                "MIME-Version: 1.0\r\n\
                 Content-Type: multipart/related; boundary=\"{MHTML_BOUNDARY}\"; type=\"text/html\"\r\n\
                 \r\n\
                 --{MHTML_BOUNDARY}\r\n\
                 Content-Type: text/html; charset=\"utf-8\"\r\n\
                 Content-Location: {}\r\n\
                 \r\n\
                 {}\r\n\
                 --{MHTML_BOUNDARY}--\r\n",
                state.url,
                with_styles(&state.document, &state.css),
            ),
        };
        Ok(html.into_bytes())
    }

    async fn insert_css(&self, key: &str, css: &str, origin: CssOrigin) -> Result<(), EngineError> {
        self.live()?
            .css
            .insert(key.to_string(), (css.to_string(), origin));
        Ok(())
    }

    async fn remove_css(&self, key: &str) -> Result<(), EngineError> {
        self.live()?.css.remove(key);
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<(), EngineError> {
        let mut state = self.live()?;
        match state.document.rfind("</body>") {
            Some(at) => state.document.insert_str(at, text),
            None => state.document.push_str(text),
        }
        Ok(())
    }

    async fn count_matches(&self, text: &str, match_case: bool) -> Result<usize, EngineError> {
        let state = self.live()?;
        if text.is_empty() {
            return Ok(0);
        }
        let haystack = visible_text(&state.document);
        let count = if match_case {
            haystack.matches(text).count()
        } else {
            haystack.to_lowercase().matches(&text.to_lowercase()).count()
        };
        Ok(count)
    }

    async fn print(&self, settings: &PrintSettings) -> Result<(), EngineError> {
        self.delay().await;
        let printer = match &settings.device_name {
            Some(name) => self.printers.iter().find(|p| &p.name == name),
            None => self
                .printers
                .iter()
                .find(|p| p.is_default)
                .or_else(|| self.printers.first()),
        };
        let Some(printer) = printer else {
            return Err(EngineError::Host(match &settings.device_name {
                Some(name) => format!("no printer named {name:?}"),
                None => "no printers available".into(),
            }));
        };

        let mut state = self.live()?;
        let options = PrintOptions {
            landscape: settings.landscape,
            print_background: settings.print_background,
            ..PrintOptions::default()
        };
        let job = PrintJob {
            printer: printer.name.clone(),
            copies: settings.copies.max(1),
            silent: settings.silent,
            document: render_pdf(&state.document, &options),
        };
        info!(printer = %job.printer, copies = job.copies, "Headless print job finished");
        state.jobs.push(job);
        Ok(())
    }

    async fn heap_snapshot(&self) -> Result<Vec<u8>, EngineError> {
        self.delay().await;
        let state = self.live()?;
        let strings: Vec<&str> = [state.url.as_str(), state.document.as_str()]
            .into_iter()
            .chain(state.scripts.iter().map(String::as_str))
            .collect();
        let snapshot = json!({
            "snapshot": {
                "meta": { "node_fields": ["type", "name", "id", "self_size"] },
                "node_count": strings.len(),
            },
            "strings": strings,
        });
        serde_json::to_vec(&snapshot)
            .map_err(|e| EngineError::Host(format!("heap snapshot: {e}")))
    }

    async fn image_at(&self, x: i32, y: i32) -> Result<Option<NativeImage>, EngineError> {
        self.delay().await;
        let state = self.live()?;
        let view = viewport(&state);
        if x < 0 || y < 0 || x >= view.width || y >= view.height {
            return Ok(None);
        }
        Ok(frame(&state))
    }

    fn printers(&self) -> Vec<PrinterInfo> {
        self.printers.clone()
    }

    fn send_input_event(&self, event: InputEvent) {
        let mut state = self.lock();
        if let InputEvent::Char { key_code } = &event {
            if state.focused {
                match state.document.rfind("</body>") {
                    Some(at) => state.document.insert_str(at, key_code),
                    None => state.document.push_str(key_code),
                }
            }
        }
        state.inputs.push(event);
    }

    fn is_waiting_for_response(&self) -> bool {
        self.lock().waiting_for_response
    }

    fn load_url(&self, url: &str) {
        let mut state = self.lock();
        state.document = match url.strip_prefix(DATA_HTML_PREFIX) {
            Some(html) => html.to_string(),
            None => blank_document(url),
        };
        state.url = url.to_string();
        state.css.clear();
        state.highlight = None;
        state.load_state = LoadState::Idle;
        state.waiting_for_response = false;
        debug!(url, "Headless navigation committed");
    }

    fn reload(&self) {
        let mut state = self.lock();
        state.reloads += 1;
        state.highlight = None;
    }

    fn edit(&self, command: EditCommand) {
        self.lock().edits.push(command);
    }

    fn apply(&self, setting: EngineSetting) {
        let mut state = self.lock();
        match setting {
            EngineSetting::AudioMuted(muted) => state.muted = muted,
            EngineSetting::ZoomFactor(zoom) => state.zoom_factor = zoom,
            EngineSetting::UserAgent(ua) => state.user_agent = ua,
            EngineSetting::FrameRate(rate) => state.frame_rate = rate,
            EngineSetting::BackgroundThrottling(on) => state.background_throttling = on,
            EngineSetting::WebRtcIpHandlingPolicy(policy) => state.webrtc_policy = policy,
            EngineSetting::Painting(on) => state.painting = on,
            EngineSetting::Invalidate => {}
            EngineSetting::Resize(size) => state.size = size,
            EngineSetting::BackgroundColor(color) => state.background = color,
            EngineSetting::Focus(focused) => state.focused = focused,
            EngineSetting::DevTools(devtools) => state.devtools = devtools,
            EngineSetting::FindHighlight {
                text,
                active_match_ordinal,
            } => state.highlight = Some((text, active_match_ordinal)),
            EngineSetting::StopFind(_) => state.highlight = None,
            EngineSetting::DeviceEmulation(emulation) => state.emulation = emulation,
            EngineSetting::IgnoreMenuShortcuts(ignore) => state.ignore_menu_shortcuts = ignore,
        }
    }

    fn url(&self) -> String {
        self.lock().url.clone()
    }

    fn title(&self) -> String {
        let state = self.lock();
        document_title(&state.document).unwrap_or_else(|| state.url.clone())
    }

    fn load_state(&self) -> LoadState {
        self.lock().load_state
    }

    fn is_audible(&self) -> bool {
        self.lock().audible
    }

    fn is_crashed(&self) -> bool {
        self.lock().crashed
    }

    fn os_process_id(&self) -> u32 {
        self.pid
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        if !state.shut_down {
            state.shut_down = true;
            info!(pid = self.pid, "Headless engine shut down");
        }
    }
}

/// Spawns [`HeadlessEngine`]s and keeps them reachable by content id for
/// as long as their content process holds them.
pub struct HeadlessFactory {
    latency: Duration,
    printers: Vec<PrinterInfo>,
    engines: Mutex<HashMap<ContentId, Weak<HeadlessEngine>>>,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            printers: default_printers(),
            engines: Mutex::new(HashMap::new()),
        }
    }
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Printers every spawned engine reports.
    pub fn with_printers(mut self, printers: Vec<PrinterInfo>) -> Self {
        self.printers = printers;
        self
    }

    pub fn engine(&self, id: ContentId) -> Option<Arc<HeadlessEngine>> {
        self.engines().get(&id).and_then(Weak::upgrade)
    }

    /// Ids of engines still held by a content process, ascending.
    pub fn live_ids(&self) -> Vec<ContentId> {
        let mut ids: Vec<ContentId> = self
            .engines()
            .iter()
            .filter(|(_, engine)| engine.strong_count() > 0)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    fn engines(&self) -> MutexGuard<'_, HashMap<ContentId, Weak<HeadlessEngine>>> {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineFactory for HeadlessFactory {
    fn spawn(&self, id: ContentId, spec: EngineSpec) -> Result<Arc<dyn ContentEngine>, HostError> {
        let engine = Arc::new(
            HeadlessEngine::from_spec(id, spec)
                .with_latency(self.latency)
                .with_printers(self.printers.clone()),
        );
        let mut engines = self.engines();
        engines.retain(|_, engine| engine.strong_count() > 0);
        engines.insert(id, Arc::downgrade(&engine));
        drop(engines);
        debug!(content_id = %id, "Spawned headless engine");
        Ok(engine)
    }
}

/// Viewport size, honouring an emulated view size.
fn viewport(state: &HeadlessState) -> Size {
    match state.emulation {
        Some(emulation) if emulation.view_size.width > 0 && emulation.view_size.height > 0 => {
            emulation.view_size
        }
        _ => state.size,
    }
}

/// Current frame filled with the background colour.
fn frame(state: &HeadlessState) -> Option<NativeImage> {
    let size = viewport(state);
    if !state.painting || size.width <= 0 || size.height <= 0 {
        return None;
    }
    let c = state.background;
    Some(NativeImage::filled(
        size.width as u32,
        size.height as u32,
        [c.r, c.g, c.b, c.a],
    ))
}

fn render_pdf(document: &str, options: &PrintOptions) -> Vec<u8> {
    let text = visible_text(document);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let (width, height) = options.page_size();
    pdf::render(&lines, width, height)
}

fn evaluate(code: &str, state: &HeadlessState) -> Result<Value, EngineError> {
    let code = code.trim().trim_end_matches(';').trim();
    if code.is_empty() {
        return Ok(Value::Null);
    }
    if let Some(thrown) = code.strip_prefix("throw ") {
        let thrown = thrown.trim();
        let description = match serde_json::from_str::<Value>(thrown) {
            Ok(Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(_) => thrown.to_string(),
        };
        return Err(EngineError::Script(format!("Uncaught {description}")));
    }
    match code {
        "document.title" => {
            return Ok(Value::String(
                document_title(&state.document).unwrap_or_default(),
            ))
        }
        "location.href" | "window.location.href" => return Ok(Value::String(state.url.clone())),
        "document.body.innerText" => return Ok(Value::String(visible_text(&state.document))),
        "navigator.userAgent" => return Ok(Value::String(state.user_agent.clone())),
        _ => {}
    }
    Ok(serde_json::from_str(code).unwrap_or(Value::Null))
}

fn blank_document(title: &str) -> String {
    format!("<html><head><title>{title}</title></head><body></body></html>")
}

fn document_title(html: &str) -> Option<String> {
    let start = html.find("<title>")? + "<title>".len();
    let end = html[start..].find("</title>")? + start;
    Some(html[start..end].to_string())
}

/// Document text with tags and the `<head>` removed.
fn visible_text(html: &str) -> String {
    let body = match (html.find("</head>"), html.find("<head>")) {
        (Some(end), Some(_)) => &html[end + "</head>".len()..],
        _ => html,
    };
    let mut out = String::with_capacity(body.len());
    let mut in_tag = false;
    for ch in body.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn with_styles(html: &str, css: &BTreeMap<String, (String, CssOrigin)>) -> String {
    if css.is_empty() {
        return html.to_string();
    }
    let styles: String = css
        .iter()
        .map(|(key, (rules, _))| format!("<style data-key=\"{key}\">{rules}</style>"))
        .collect();
    match html.find("</head>") {
        Some(at) => {
            let mut out = html.to_string();
            out.insert_str(at, &styles);
            out
        }
        None => format!("{styles}{html}"),
    }
}
