//! Channel-name to listener-list table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::listener::Listener;
use crate::message::IpcMessage;

struct Registration {
    listener: Listener,
    once: bool,
    /// Claimed by the single dispatch allowed to run a `once` listener.
    fired: AtomicBool,
}

/// Ordered listener lists keyed by channel.
///
/// Lists are only mutated by `on`, `once`, `off`, `remove_all_listeners`
/// and the removal of a `once` registration that has fired. Dispatch runs
/// against a copy of the list taken when it starts, so listeners may
/// (un)register freely from inside a callback.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Mutex<HashMap<String, Vec<Arc<Registration>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to `channel`. Registering the same listener twice
    /// makes it run twice per message.
    pub fn on(&self, channel: &str, listener: Listener) {
        self.push(channel, listener, false);
    }

    /// Like [`on`](Self::on), but the registration is removed after it runs
    /// once.
    pub fn once(&self, channel: &str, listener: Listener) {
        self.push(channel, listener, true);
    }

    /// Remove the first registration of `listener` on `channel`.
    pub fn off(&self, channel: &str, listener: &Listener) {
        let mut channels = self.lock();
        if let Some(list) = channels.get_mut(channel) {
            if let Some(pos) = list.iter().position(|r| &r.listener == listener) {
                list.remove(pos);
            }
            if list.is_empty() {
                channels.remove(channel);
            }
        }
    }

    pub fn remove_all_listeners(&self, channel: &str) {
        self.lock().remove(channel);
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, Vec::len)
    }

    /// Channels that currently have at least one listener, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Deliver `message` to every listener registered on its channel when
    /// dispatch starts. Returns the number of listener invocations.
    pub fn dispatch(&self, message: &IpcMessage) -> usize {
        let snapshot: Vec<Arc<Registration>> = match self.lock().get(&message.channel) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let event = message.event();
        let mut invoked = 0;
        for registration in snapshot {
            if registration.once {
                if registration.fired.swap(true, Ordering::AcqRel) {
                    continue;
                }
                self.remove_registration(&message.channel, &registration);
            }
            registration.listener.call(&event, &message.payload);
            invoked += 1;
        }

        trace!(
            channel = %message.channel,
            sender_id = message.sender_id,
            invoked,
            "ipc dispatch"
        );
        invoked
    }

    fn push(&self, channel: &str, listener: Listener, once: bool) {
        self.lock()
            .entry(channel.to_string())
            .or_default()
            .push(Arc::new(Registration {
                listener,
                once,
                fired: AtomicBool::new(false),
            }));
    }

    fn remove_registration(&self, channel: &str, registration: &Arc<Registration>) {
        let mut channels = self.lock();
        if let Some(list) = channels.get_mut(channel) {
            list.retain(|r| !Arc::ptr_eq(r, registration));
            if list.is_empty() {
                channels.remove(channel);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Arc<Registration>>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Listener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = Listener::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    fn msg(channel: &str) -> IpcMessage {
        IpcMessage::new(1, channel, vec![json!(1)])
    }

    #[test]
    fn on_receives_every_message() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.on("ch", l);

        registry.dispatch(&msg("ch"));
        registry.dispatch(&msg("ch"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_receives_event_and_payload() {
        let registry = ChannelRegistry::new();
        let seen: Arc<Mutex<Vec<(u32, Vec<Value>)>>> = Arc::default();
        let s = Arc::clone(&seen);
        registry.on(
            "ch",
            Listener::new(move |event, args| {
                s.lock().unwrap().push((event.sender_id, args.to_vec()));
            }),
        );

        registry.dispatch(&IpcMessage::new(9, "ch", vec![json!(1), json!(2)]));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(9, vec![json!(1), json!(2)])]);
    }

    #[test]
    fn duplicate_registration_runs_twice() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.on("ch", l.clone());
        registry.on("ch", l);

        assert_eq!(registry.dispatch(&msg("ch")), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn once_fires_a_single_time() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.once("ch", l);

        registry.dispatch(&msg("ch"));
        registry.dispatch(&msg("ch"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.listener_count("ch"), 0);
    }

    #[test]
    fn once_is_claimed_by_one_of_many_concurrent_dispatches() {
        let registry = Arc::new(ChannelRegistry::new());
        let (l, count) = counter();
        registry.once("ch", l);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.dispatch(&msg("ch"));
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_before_dispatch_prevents_invocation() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.on("ch", l.clone());
        registry.off("ch", &l);

        assert_eq!(registry.dispatch(&msg("ch")), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_removes_only_first_duplicate() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.on("ch", l.clone());
        registry.on("ch", l.clone());
        registry.off("ch", &l);

        registry.dispatch(&msg("ch"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_unknown_listener_is_noop() {
        let registry = ChannelRegistry::new();
        let (l, _) = counter();
        let (other, _) = counter();
        registry.on("ch", l);
        registry.off("ch", &other);
        registry.off("missing", &other);
        assert_eq!(registry.listener_count("ch"), 1);
    }

    #[test]
    fn self_removal_does_not_affect_current_pass() {
        let registry = Arc::new(ChannelRegistry::new());
        let (second, second_count) = counter();

        let slot: Arc<Mutex<Option<Listener>>> = Arc::default();
        let reg = Arc::clone(&registry);
        let slot_in = Arc::clone(&slot);
        let victim = second.clone();
        let first = Listener::new(move |_, _| {
            // Remove both itself and the listener after it.
            if let Some(me) = slot_in.lock().unwrap().as_ref() {
                reg.off("ch", me);
            }
            reg.off("ch", &victim);
        });
        *slot.lock().unwrap() = Some(first.clone());

        registry.on("ch", first);
        registry.on("ch", second);

        assert_eq!(registry.dispatch(&msg("ch")), 2);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.listener_count("ch"), 0);
        assert_eq!(registry.dispatch(&msg("ch")), 0);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_message() {
        let registry = Arc::new(ChannelRegistry::new());
        let (late, late_count) = counter();
        let reg = Arc::clone(&registry);
        registry.once(
            "ch",
            Listener::new(move |_, _| {
                reg.on("ch", late.clone());
            }),
        );

        registry.dispatch(&msg("ch"));
        assert_eq!(late_count.load(Ordering::SeqCst), 0);
        registry.dispatch(&msg("ch"));
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn channels_are_independent() {
        let registry = ChannelRegistry::new();
        let (a, a_count) = counter();
        let (b, b_count) = counter();
        registry.on("a", a);
        registry.on("b", b);

        registry.dispatch(&msg("a"));
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.channels(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn remove_all_listeners_clears_channel() {
        let registry = ChannelRegistry::new();
        let (l, count) = counter();
        registry.on("ch", l.clone());
        registry.once("ch", l);
        registry.remove_all_listeners("ch");

        assert_eq!(registry.dispatch(&msg("ch")), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(registry.channels().is_empty());
    }
}
