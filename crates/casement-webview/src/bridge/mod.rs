//! Capability bridge between page script and the controller.
//!
//! A bridge is built once per content process from a fixed grant set.
//! Nothing outside that set is reachable from the page: the injected shim
//! only defines granted methods, and [`CapabilityBridge::invoke`] refuses
//! ungranted calls even if a page forges the message.

mod script;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use casement_common::{HostError, PlatformError};
use casement_ipc::IpcEndpoint;
use casement_platform::{Clipboard, ClipboardType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use script::js_settle;

/// Clipboard shared between the controller and every bridge.
pub type SharedClipboard = Arc<Mutex<dyn Clipboard>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SendToHost,
    SendToContent,
    ClipboardReadText,
    ClipboardWriteText,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::SendToHost,
        Capability::SendToContent,
        Capability::ClipboardReadText,
        Capability::ClipboardWriteText,
    ];

    /// Grants used when web preferences do not list any.
    pub fn default_grants() -> BTreeSet<Capability> {
        BTreeSet::from([Capability::SendToHost])
    }

    /// Method name on the page-side `window.casement` object.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::SendToHost => "sendToHost",
            Self::SendToContent => "sendTo",
            Self::ClipboardReadText => "readClipboardText",
            Self::ClipboardWriteText => "writeClipboardText",
        }
    }
}

/// One page-initiated call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeCall {
    SendToHost {
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    SendToContent {
        id: u32,
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    ClipboardReadText,
    ClipboardWriteText {
        text: String,
    },
}

impl BridgeCall {
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::SendToHost { .. } => Capability::SendToHost,
            Self::SendToContent { .. } => Capability::SendToContent,
            Self::ClipboardReadText => Capability::ClipboardReadText,
            Self::ClipboardWriteText { .. } => Capability::ClipboardWriteText,
        }
    }
}

/// What the shim posts: a call plus the id of the promise awaiting it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct BridgeRequest {
    #[serde(default)]
    id: Option<u64>,
    call: BridgeCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeReply {
    Sent,
    Text(String),
    Written,
}

impl BridgeReply {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Sent | Self::Written => Value::Null,
        }
    }
}

pub struct CapabilityBridge {
    grants: BTreeSet<Capability>,
    endpoint: IpcEndpoint,
    clipboard: Option<SharedClipboard>,
}

impl CapabilityBridge {
    pub fn new(grants: BTreeSet<Capability>, endpoint: IpcEndpoint) -> Self {
        Self {
            grants,
            endpoint,
            clipboard: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: SharedClipboard) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn grants(&self) -> &BTreeSet<Capability> {
        &self.grants
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.grants.contains(&capability)
    }

    /// Names of the methods the page can see.
    pub fn exposed(&self) -> Vec<&'static str> {
        self.grants.iter().map(|cap| cap.method_name()).collect()
    }

    /// Shim to run in the page before any other script.
    pub fn init_script(&self) -> String {
        script::init_script(&self.grants)
    }

    pub fn invoke(&self, call: BridgeCall) -> Result<BridgeReply, HostError> {
        let capability = call.capability();
        if !self.is_granted(capability) {
            warn!(
                content_id = self.endpoint.id(),
                capability = capability.method_name(),
                "Refusing ungranted bridge call"
            );
            return Err(HostError::CapabilityDenied(capability.method_name().into()));
        }

        match call {
            BridgeCall::SendToHost { channel, args } => {
                self.endpoint.send_to_host(&channel, args);
                Ok(BridgeReply::Sent)
            }
            BridgeCall::SendToContent { id, channel, args } => {
                self.endpoint.send_to(id, &channel, args);
                Ok(BridgeReply::Sent)
            }
            BridgeCall::ClipboardReadText => {
                let clipboard = self.clipboard()?;
                let mut clipboard = clipboard.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(BridgeReply::Text(clipboard.read_text(ClipboardType::Clipboard)?))
            }
            BridgeCall::ClipboardWriteText { text } => {
                let clipboard = self.clipboard()?;
                let mut clipboard = clipboard.lock().unwrap_or_else(PoisonError::into_inner);
                clipboard.write_text(&text, ClipboardType::Clipboard)?;
                Ok(BridgeReply::Written)
            }
        }
    }

    /// Handle one raw message posted by the shim. Returns the script that
    /// settles the page's promise, if the message asked for one.
    pub fn handle_post(&self, raw: &str) -> Option<String> {
        let request: BridgeRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    content_id = self.endpoint.id(),
                    error = %e,
                    "Malformed bridge message"
                );
                return None;
            }
        };
        debug!(content_id = self.endpoint.id(), call = ?request.call, "Bridge call");

        let result = self.invoke(request.call);
        let id = request.id?;
        Some(match result {
            Ok(reply) => js_settle(id, true, &reply.to_value()),
            Err(e) => js_settle(id, false, &Value::String(e.to_string())),
        })
    }

    pub(crate) fn clipboard(&self) -> Result<&SharedClipboard, HostError> {
        self.clipboard.as_ref().ok_or_else(|| {
            HostError::Platform(PlatformError::NotSupported(
                "no clipboard attached to this bridge".into(),
            ))
        })
    }
}
