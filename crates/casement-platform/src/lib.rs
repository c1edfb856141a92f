//! Platform collaborators of the host: clipboard access and the native
//! image value type. Both are synchronous data marshalling with no state
//! machine of their own.

pub mod clipboard;
pub mod native_image;

pub use clipboard::{
    Bookmark, Clipboard, ClipboardData, ClipboardType, MemoryClipboard, SystemClipboard,
};
pub use native_image::{BufferOptions, NativeImage};
