use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::{ContentId, WindowId};
use crate::types::{Rect, WindowState};

/// Lifecycle notifications published by the window manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WindowEvent {
    Created {
        window_id: WindowId,
        content_id: ContentId,
    },
    StateChanged {
        window_id: WindowId,
        from: WindowState,
        to: WindowState,
    },
    VisibilityChanged {
        window_id: WindowId,
        visible: bool,
    },
    FocusChanged {
        window_id: WindowId,
        focused: bool,
    },
    BoundsChanged {
        window_id: WindowId,
        bounds: Rect,
    },
    Destroyed {
        window_id: WindowId,
    },
}

impl WindowEvent {
    pub fn window_id(&self) -> WindowId {
        match self {
            Self::Created { window_id, .. }
            | Self::StateChanged { window_id, .. }
            | Self::VisibilityChanged { window_id, .. }
            | Self::FocusChanged { window_id, .. }
            | Self::BoundsChanged { window_id, .. }
            | Self::Destroyed { window_id } => *window_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WindowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: WindowEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
