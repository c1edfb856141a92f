//! IPC channel registry shared by the controller and content processes.
//!
//! - [`ChannelRegistry`] maps channel names to ordered listener lists and
//!   dispatches against a snapshot of that list.
//! - [`Router`] owns one unbounded mailbox per live process and pumps it
//!   on the tokio runtime, giving FIFO delivery per destination.
//! - [`IpcEndpoint`] is the per-process view: listen on its own registry,
//!   send to any other process by id.
//!
//! Delivery is fire-and-forget. Sending to an id that is not live drops the
//! message without reporting an error.

pub mod endpoint;
pub mod listener;
pub mod message;
pub mod registry;
pub mod router;

pub use endpoint::IpcEndpoint;
pub use listener::Listener;
pub use message::{IpcEvent, IpcMessage};
pub use registry::ChannelRegistry;
pub use router::Router;
