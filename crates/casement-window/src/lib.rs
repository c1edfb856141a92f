//! Windows and the manager that owns them.
//!
//! A [`Window`] is a cloneable handle to one top-level window and the
//! content process it hosts. The [`WindowManager`] creates windows, keeps
//! the stacking order and focus, and publishes every lifecycle change on
//! its event bus.

pub mod manager;
pub mod options;
pub mod window;

pub use manager::WindowManager;
pub use options::{WindowFlags, WindowOptions};
pub use window::Window;
