//! Stacking order and focus tracking.

use std::collections::HashSet;

use casement_common::WindowId;

/// Windows bottom to top. Always-on-top windows form an upper tier that
/// ordinary windows never rise above.
#[derive(Debug, Default)]
pub(crate) struct Stacking {
    order: Vec<WindowId>,
    on_top: HashSet<WindowId>,
    focused: Option<WindowId>,
}

impl Stacking {
    /// Place `id` at the top of its tier.
    pub(crate) fn insert(&mut self, id: WindowId, on_top: bool) {
        self.order.retain(|w| *w != id);
        if on_top {
            self.on_top.insert(id);
        } else {
            self.on_top.remove(&id);
        }
        let at = self.tier_end(on_top);
        self.order.insert(at, id);
    }

    pub(crate) fn remove(&mut self, id: WindowId) {
        self.order.retain(|w| *w != id);
        self.on_top.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    /// Move `id` to the top of its tier. Unknown ids are ignored.
    pub(crate) fn raise(&mut self, id: WindowId) {
        if self.order.contains(&id) {
            let on_top = self.on_top.contains(&id);
            self.insert(id, on_top);
        }
    }

    pub(crate) fn set_on_top(&mut self, id: WindowId, on_top: bool) {
        if self.order.contains(&id) {
            self.insert(id, on_top);
        }
    }

    /// Front to back.
    pub(crate) fn front_to_back(&self) -> Vec<WindowId> {
        self.order.iter().rev().copied().collect()
    }

    pub(crate) fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    /// Focus `id` and raise it. Returns the previously focused window if
    /// focus moved away from it.
    pub(crate) fn focus(&mut self, id: WindowId) -> Option<WindowId> {
        self.raise(id);
        let previous = self.focused.replace(id);
        previous.filter(|prev| *prev != id)
    }

    /// Drop focus from `id`. Returns whether it held focus.
    pub(crate) fn blur(&mut self, id: WindowId) -> bool {
        if self.focused == Some(id) {
            self.focused = None;
            true
        } else {
            false
        }
    }

    fn tier_end(&self, on_top: bool) -> usize {
        if on_top {
            return self.order.len();
        }
        self.order
            .iter()
            .position(|w| self.on_top.contains(w))
            .unwrap_or(self.order.len())
    }
}
