//! Scripted session: open windows, wait for every content process to
//! report in over IPC, drive a few state transitions and summarise.

use std::fmt;
use std::time::Duration;

use casement_common::{ContentId, HostError, Rect, WindowId, WindowState};
use casement_ipc::Listener;
use casement_window::{Window, WindowManager, WindowOptions};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const PAGE: &str = "data:text/html,<html><head><title>Casement</title></head>\
                    <body><p>hello from casement</p></body></html>";

const READY_CHANNEL: &str = "ready";
const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Observable state of one window at the end of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub id: WindowId,
    pub content_id: ContentId,
    pub title: String,
    pub state: WindowState,
    pub bounds: Rect,
    pub visible: bool,
    pub focused: bool,
    pub page_title: Value,
}

impl WindowSummary {
    async fn of(window: &Window) -> Result<Self, HostError> {
        let content = window.web_contents()?;
        Ok(Self {
            id: window.id(),
            content_id: content.id(),
            title: window.title()?,
            state: window.state()?,
            bounds: window.bounds()?,
            visible: window.is_visible()?,
            focused: window.is_focused()?,
            page_title: content.execute_javascript("document.title", false).await?,
        })
    }
}

impl fmt::Display for WindowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bounds;
        write!(
            f,
            "window {} (content {}) {:<10} {}x{}+{}+{}{}",
            self.id,
            self.content_id,
            self.state.to_string(),
            b.width,
            b.height,
            b.x,
            b.y,
            if self.focused { " focused" } else { "" }
        )
    }
}

/// Run the session and return one summary per window, in creation order.
pub async fn run(manager: &WindowManager, count: u32) -> Result<Vec<WindowSummary>, HostError> {
    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel();
    manager.router().controller().on(
        READY_CHANNEL,
        Listener::new(move |event, _| {
            let _ = ready_tx.send(event.sender_id);
        }),
    );

    let mut windows = Vec::new();
    for i in 0..count {
        let window = manager.create(WindowOptions {
            title: format!("Window {}", i + 1),
            ..WindowOptions::default()
        })?;
        let content = window.web_contents()?;
        content.load_url(PAGE)?;
        content
            .ipc()?
            .send_to_host(READY_CHANNEL, vec![json!(window.id().0)]);
        windows.push(window);
    }

    let mut ready = 0;
    while ready < count {
        match tokio::time::timeout(READY_TIMEOUT, ready_rx.recv()).await {
            Ok(Some(sender)) => {
                debug!(sender, "Content process ready");
                ready += 1;
            }
            _ => {
                warn!(ready, expected = count, "Not every content process reported ready");
                break;
            }
        }
    }

    for (i, window) in windows.iter().enumerate() {
        match i % 3 {
            1 => window.maximize()?,
            2 => window.minimize()?,
            _ => {}
        }
    }
    if let Some(first) = windows.first() {
        first.focus()?;
    }
    info!(windows = windows.len(), ready, "Session scripted");

    let mut summaries = Vec::with_capacity(windows.len());
    for window in &windows {
        summaries.push(WindowSummary::of(window).await?);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use casement_config::HostConfig;
    use casement_webview::HeadlessFactory;

    use super::*;

    #[tokio::test]
    async fn session_drives_each_window() {
        let manager =
            WindowManager::new(HostConfig::default(), Arc::new(HeadlessFactory::new())).unwrap();
        let summaries = run(&manager, 3).await.unwrap();

        let states: Vec<WindowState> = summaries.iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![WindowState::Normal, WindowState::Maximized, WindowState::Minimized]
        );
        assert!(summaries[0].focused);
        assert!(summaries[1..].iter().all(|s| !s.focused));
        assert_eq!(summaries[0].page_title, json!("Casement"));
        assert_eq!(summaries[2].title, "Window 3");
    }

    #[tokio::test]
    async fn summary_serializes_for_json_output() {
        let manager =
            WindowManager::new(HostConfig::default(), Arc::new(HeadlessFactory::new())).unwrap();
        let summaries = run(&manager, 1).await.unwrap();
        let value = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["state"], json!("normal"));
        assert_eq!(value["bounds"]["width"], json!(800));
        assert!(summaries[0].to_string().starts_with("window 1 (content 1) normal"));
    }
}
