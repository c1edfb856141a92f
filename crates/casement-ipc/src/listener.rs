use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::message::IpcEvent;

type ListenerFn = dyn Fn(&IpcEvent, &[Value]) + Send + Sync;

/// A channel listener.
///
/// Cloning yields the *same* listener: `off` matches registrations by
/// identity, so keep a clone of whatever was passed to `on`/`once`.
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&IpcEvent, &[Value]) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, event: &IpcEvent, args: &[Value]) {
        (self.0)(event, args)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_are_equal() {
        let l = Listener::new(|_, _| {});
        assert_eq!(l, l.clone());
    }

    #[test]
    fn identical_closures_are_distinct_listeners() {
        let a = Listener::new(|_, _| {});
        let b = Listener::new(|_, _| {});
        assert_ne!(a, b);
    }
}
