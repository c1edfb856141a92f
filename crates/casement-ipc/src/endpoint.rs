use std::sync::Arc;

use casement_common::CONTROLLER_SENDER_ID;
use serde_json::Value;

use crate::listener::Listener;
use crate::registry::ChannelRegistry;
use crate::router::Router;

/// One process's view of the IPC fabric: its own listener registry plus
/// the ability to send to others. Messages sent through an endpoint carry
/// the endpoint's id as `sender_id`.
#[derive(Clone)]
pub struct IpcEndpoint {
    id: u32,
    registry: Arc<ChannelRegistry>,
    router: Router,
}

impl IpcEndpoint {
    pub(crate) fn new(id: u32, registry: Arc<ChannelRegistry>, router: Router) -> Self {
        Self {
            id,
            registry,
            router,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_controller(&self) -> bool {
        self.id == CONTROLLER_SENDER_ID
    }

    pub fn on(&self, channel: &str, listener: Listener) {
        self.registry.on(channel, listener);
    }

    pub fn once(&self, channel: &str, listener: Listener) {
        self.registry.once(channel, listener);
    }

    pub fn off(&self, channel: &str, listener: &Listener) {
        self.registry.off(channel, listener);
    }

    /// Fire-and-forget send to the process `id`.
    pub fn send_to(&self, id: u32, channel: &str, args: Vec<Value>) {
        self.router.send(self.id, id, channel, args);
    }

    /// Fire-and-forget send to the controller process.
    pub fn send_to_host(&self, channel: &str, args: Vec<Value>) {
        self.router.send(self.id, CONTROLLER_SENDER_ID, channel, args);
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}
