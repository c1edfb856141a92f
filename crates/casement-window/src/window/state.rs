//! Window state machine.
//!
//! ```text
//! normal    --maximize-->          maximized --unmaximize-->      normal
//! normal    --minimize-->          minimized --restore-->         normal
//! normal    --setFullScreen(true)--> fullscreen --setFullScreen(false)--> normal
//! maximized --minimize-->          minimized
//! maximized --setFullScreen(true)--> fullscreen
//! any       --destroy-->           destroyed (terminal)
//! ```
//!
//! Requests outside the table are ignored. Kiosk mode pins the window in
//! fullscreen.

use casement_common::{HostError, WindowEvent, WindowState};
use tracing::{debug, info, warn};

use super::{Window, WindowData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Maximize,
    Unmaximize,
    Minimize,
    Restore,
    EnterFullScreen,
    LeaveFullScreen,
}

pub(crate) fn next_state(from: WindowState, transition: Transition) -> Option<WindowState> {
    use Transition::*;
    use WindowState::*;
    match (from, transition) {
        (Normal, Maximize) => Some(Maximized),
        (Maximized, Unmaximize) => Some(Normal),
        (Normal | Maximized, Minimize) => Some(Minimized),
        (Minimized, Restore) => Some(Normal),
        (Normal | Maximized, EnterFullScreen) => Some(FullScreen),
        (FullScreen, LeaveFullScreen) => Some(Normal),
        _ => None,
    }
}

impl Window {
    pub fn maximize(&self) -> Result<(), HostError> {
        self.transition(Transition::Maximize)
    }

    pub fn unmaximize(&self) -> Result<(), HostError> {
        self.transition(Transition::Unmaximize)
    }

    pub fn minimize(&self) -> Result<(), HostError> {
        self.transition(Transition::Minimize)
    }

    pub fn restore(&self) -> Result<(), HostError> {
        self.transition(Transition::Restore)
    }

    pub fn set_full_screen(&self, flag: bool) -> Result<(), HostError> {
        if flag {
            self.transition(Transition::EnterFullScreen)
        } else {
            self.transition(Transition::LeaveFullScreen)
        }
    }

    /// Kiosk forces fullscreen; leaving kiosk returns to normal.
    pub fn set_kiosk(&self, flag: bool) -> Result<(), HostError> {
        let mut events = Vec::new();
        {
            let mut data = self.data()?;
            if data.flags.kiosk == flag {
                return Ok(());
            }
            data.flags.kiosk = flag;
            info!(window_id = %self.inner.id, kiosk = flag, "Kiosk mode changed");
            if flag && data.state != WindowState::FullScreen {
                self.enter_state(&mut data, WindowState::FullScreen, &mut events);
            } else if !flag && data.state == WindowState::FullScreen {
                self.enter_state(&mut data, WindowState::Normal, &mut events);
            }
        }
        self.emit(events);
        Ok(())
    }

    pub fn is_kiosk(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.kiosk)
    }

    pub fn state(&self) -> Result<WindowState, HostError> {
        Ok(self.data()?.state)
    }

    pub fn is_normal(&self) -> Result<bool, HostError> {
        Ok(self.state()? == WindowState::Normal)
    }

    pub fn is_maximized(&self) -> Result<bool, HostError> {
        Ok(self.state()? == WindowState::Maximized)
    }

    pub fn is_minimized(&self) -> Result<bool, HostError> {
        Ok(self.state()? == WindowState::Minimized)
    }

    pub fn is_full_screen(&self) -> Result<bool, HostError> {
        Ok(self.state()? == WindowState::FullScreen)
    }

    fn transition(&self, transition: Transition) -> Result<(), HostError> {
        let mut events = Vec::new();
        let entered = {
            let mut data = self.data()?;
            let kiosk_locked = matches!(
                transition,
                Transition::Maximize | Transition::Minimize | Transition::LeaveFullScreen
            );
            if data.flags.kiosk && kiosk_locked {
                warn!(window_id = %self.inner.id, ?transition, "Ignored while in kiosk mode");
                return Ok(());
            }
            if transition == Transition::EnterFullScreen && !data.flags.fullscreenable {
                warn!(window_id = %self.inner.id, "Window is not fullscreenable");
                return Ok(());
            }
            let Some(to) = next_state(data.state, transition) else {
                debug!(
                    window_id = %self.inner.id,
                    from = %data.state,
                    ?transition,
                    "No transition from current state"
                );
                return Ok(());
            };
            self.enter_state(&mut data, to, &mut events);
            to
        };
        self.emit(events);
        if entered == WindowState::Minimized {
            self.blur()?;
        }
        Ok(())
    }

    /// Switch to `to` and move to the geometry that state implies.
    pub(super) fn enter_state(
        &self,
        data: &mut WindowData,
        to: WindowState,
        events: &mut Vec<WindowEvent>,
    ) {
        let from = data.state;
        if from == WindowState::Normal {
            data.normal_bounds = data.bounds;
        }
        data.state = to;
        events.push(WindowEvent::StateChanged {
            window_id: self.inner.id,
            from,
            to,
        });
        let bounds = match to {
            WindowState::Maximized => self.inner.display.work_area(),
            WindowState::FullScreen => self.inner.display.bounds(),
            WindowState::Normal => data.normal_bounds,
            WindowState::Minimized | WindowState::Destroyed => data.bounds,
        };
        self.commit_bounds(data, bounds, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Transition::*;
    use WindowState::*;

    #[test]
    fn table_transitions() {
        assert_eq!(next_state(Normal, Maximize), Some(Maximized));
        assert_eq!(next_state(Maximized, Unmaximize), Some(Normal));
        assert_eq!(next_state(Normal, Minimize), Some(Minimized));
        assert_eq!(next_state(Maximized, Minimize), Some(Minimized));
        assert_eq!(next_state(Minimized, Restore), Some(Normal));
        assert_eq!(next_state(Normal, EnterFullScreen), Some(FullScreen));
        assert_eq!(next_state(Maximized, EnterFullScreen), Some(FullScreen));
        assert_eq!(next_state(FullScreen, LeaveFullScreen), Some(Normal));
    }

    #[test]
    fn everything_else_is_a_no_op() {
        assert_eq!(next_state(Minimized, Maximize), None);
        assert_eq!(next_state(FullScreen, Minimize), None);
        assert_eq!(next_state(FullScreen, Maximize), None);
        assert_eq!(next_state(Normal, Restore), None);
        assert_eq!(next_state(Normal, Unmaximize), None);
        assert_eq!(next_state(Minimized, EnterFullScreen), None);
        assert_eq!(next_state(Normal, LeaveFullScreen), None);
        for t in [Maximize, Unmaximize, Minimize, Restore, EnterFullScreen, LeaveFullScreen] {
            assert_eq!(next_state(Destroyed, t), None);
        }
    }
}
