//! Shared types for the casement host: error taxonomy, ids, geometry,
//! colours and the window event bus.

pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, HostError, PlatformError};
pub use events::{EventBus, WindowEvent};
pub use id::{ContentId, IdAllocator, WindowId, CONTROLLER_SENDER_ID};
pub use types::{Color, Rect, Size, WindowState};

pub type Result<T> = std::result::Result<T, HostError>;
