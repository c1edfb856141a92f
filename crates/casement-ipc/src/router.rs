//! Per-process mailboxes and the tasks that drain them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use casement_common::{HostError, CONTROLLER_SENDER_ID};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::endpoint::IpcEndpoint;
use crate::message::IpcMessage;
use crate::registry::ChannelRegistry;

enum Envelope {
    Message(IpcMessage),
    Barrier(oneshot::Sender<()>),
}

#[derive(Clone)]
struct Mailbox {
    tx: mpsc::UnboundedSender<Envelope>,
    depth: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    registry: Arc<ChannelRegistry>,
}

struct RouterInner {
    mailboxes: Mutex<HashMap<u32, Mailbox>>,
    runtime: Handle,
    queue_warn_depth: usize,
}

/// Process-wide table of live mailboxes.
///
/// Each registered process gets an unbounded queue drained by its own task,
/// so messages to one destination are dispatched in send order while
/// different destinations proceed independently. The controller mailbox
/// (id [`CONTROLLER_SENDER_ID`]) is registered on construction.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Create a router on the ambient tokio runtime.
    pub fn new(queue_warn_depth: usize) -> Result<Self, HostError> {
        let runtime = Handle::try_current()
            .map_err(|e| HostError::Runtime(format!("IPC router needs a tokio runtime: {e}")))?;
        Ok(Self::with_runtime(runtime, queue_warn_depth))
    }

    pub fn with_runtime(runtime: Handle, queue_warn_depth: usize) -> Self {
        let router = Self {
            inner: Arc::new(RouterInner {
                mailboxes: Mutex::new(HashMap::new()),
                runtime,
                queue_warn_depth: queue_warn_depth.max(1),
            }),
        };
        router.register(CONTROLLER_SENDER_ID);
        router
    }

    /// Runtime the pumps run on. Other per-process tasks spawn here too.
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// The controller process's endpoint.
    pub fn controller(&self) -> IpcEndpoint {
        self.register(CONTROLLER_SENDER_ID)
    }

    /// Open a mailbox for `id` and start its pump. Registering a live id
    /// again returns the existing endpoint.
    pub fn register(&self, id: u32) -> IpcEndpoint {
        let mut mailboxes = self.lock();
        if let Some(existing) = mailboxes.get(&id) {
            return IpcEndpoint::new(id, Arc::clone(&existing.registry), self.clone());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mailbox = Mailbox {
            tx,
            depth: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
            registry: Arc::new(ChannelRegistry::new()),
        };
        self.inner.runtime.spawn(pump(
            id,
            rx,
            Arc::clone(&mailbox.registry),
            Arc::clone(&mailbox.depth),
            Arc::clone(&mailbox.closed),
        ));
        let registry = Arc::clone(&mailbox.registry);
        mailboxes.insert(id, mailbox);
        drop(mailboxes);

        debug!(id, "ipc mailbox registered");
        IpcEndpoint::new(id, registry, self.clone())
    }

    /// Close the mailbox for `id`. Queued and future messages are dropped.
    pub fn unregister(&self, id: u32) {
        if id == CONTROLLER_SENDER_ID {
            warn!("refusing to unregister the controller mailbox");
            return;
        }
        if let Some(mailbox) = self.lock().remove(&id) {
            mailbox.closed.store(true, Ordering::Release);
            debug!(id, "ipc mailbox closed");
        }
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.lock().contains_key(&id)
    }

    /// Ids with an open mailbox, sorted. Includes the controller.
    pub fn live_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Endpoint for an already registered id.
    pub fn endpoint(&self, id: u32) -> Option<IpcEndpoint> {
        let registry = Arc::clone(&self.lock().get(&id)?.registry);
        Some(IpcEndpoint::new(id, registry, self.clone()))
    }

    /// Enqueue a message for `destination`. Never blocks and never fails:
    /// unknown or closed destinations drop the message.
    pub fn send(&self, sender_id: u32, destination: u32, channel: &str, args: Vec<Value>) {
        let Some(mailbox) = self.lock().get(&destination).cloned() else {
            debug!(sender_id, destination, channel, "dropping message for unknown destination");
            return;
        };

        let depth = mailbox.depth.fetch_add(1, Ordering::AcqRel) + 1;
        let message = IpcMessage::new(sender_id, channel, args);
        if mailbox.tx.send(Envelope::Message(message)).is_err() {
            mailbox.depth.fetch_sub(1, Ordering::AcqRel);
            debug!(sender_id, destination, channel, "dropping message for closed mailbox");
            return;
        }

        if depth > self.inner.queue_warn_depth {
            warn!(
                destination,
                depth,
                limit = self.inner.queue_warn_depth,
                "ipc queue is deep; receiver may be stalled or sender runaway"
            );
        }
    }

    /// Wait until every message sent to `destination` before this call has
    /// been dispatched. Returns immediately for unknown destinations.
    pub async fn flush(&self, destination: u32) {
        let tx = {
            let mailboxes = self.lock();
            match mailboxes.get(&destination) {
                Some(mailbox) => mailbox.tx.clone(),
                None => return,
            }
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(Envelope::Barrier(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Messages queued for `destination` and not yet dispatched.
    pub fn queue_depth(&self, destination: u32) -> usize {
        self.lock()
            .get(&destination)
            .map_or(0, |m| m.depth.load(Ordering::Acquire))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Mailbox>> {
        self.inner
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pump(
    id: u32,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    registry: Arc<ChannelRegistry>,
    depth: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
) {
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Message(message) => {
                depth.fetch_sub(1, Ordering::AcqRel);
                if closed.load(Ordering::Acquire) {
                    continue;
                }
                registry.dispatch(&message);
            }
            Envelope::Barrier(done) => {
                let _ = done.send(());
            }
        }
        if closed.load(Ordering::Acquire) {
            break;
        }
    }
    debug!(id, "ipc pump stopped");
}
