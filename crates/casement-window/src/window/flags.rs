//! Behaviour flags, visibility, focus and stacking.

use casement_common::{Color, HostError, WindowEvent};
use tracing::debug;

use super::Window;
use crate::options::WindowFlags;

impl Window {
    pub fn flags(&self) -> Result<WindowFlags, HostError> {
        Ok(self.data()?.flags)
    }

    pub fn set_resizable(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flags.resizable = flag;
        Ok(())
    }

    pub fn is_resizable(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.resizable)
    }

    pub fn set_closable(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flags.closable = flag;
        Ok(())
    }

    pub fn is_closable(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.closable)
    }

    pub fn set_full_screenable(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flags.fullscreenable = flag;
        Ok(())
    }

    pub fn is_full_screenable(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.fullscreenable)
    }

    pub fn set_enabled(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flags.enabled = flag;
        Ok(())
    }

    pub fn is_enabled(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.enabled)
    }

    /// Moves the window between the normal and always-on-top tiers.
    pub fn set_always_on_top(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flags.always_on_top = flag;
        if let Some(shared) = self.manager() {
            shared.set_on_top(self.inner.id, flag);
        }
        Ok(())
    }

    pub fn is_always_on_top(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flags.always_on_top)
    }

    pub fn set_skip_taskbar(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.skip_taskbar = flag;
        Ok(())
    }

    pub fn is_skip_taskbar(&self) -> Result<bool, HostError> {
        Ok(self.data()?.skip_taskbar)
    }

    pub fn flash_frame(&self, flag: bool) -> Result<(), HostError> {
        self.data()?.flashing = flag;
        Ok(())
    }

    pub fn is_flashing(&self) -> Result<bool, HostError> {
        Ok(self.data()?.flashing)
    }

    pub fn has_frame(&self) -> Result<bool, HostError> {
        Ok(self.data()?.frame)
    }

    pub fn set_title(&self, title: &str) -> Result<(), HostError> {
        self.data()?.title = title.to_string();
        Ok(())
    }

    pub fn title(&self) -> Result<String, HostError> {
        Ok(self.data()?.title.clone())
    }

    pub fn set_background_color(&self, color: Color) -> Result<(), HostError> {
        self.data()?.background_color = color;
        self.inner.content.set_background_color(color)
    }

    pub fn background_color(&self) -> Result<Color, HostError> {
        Ok(self.data()?.background_color)
    }

    // -- Visibility --

    /// Show and focus the window.
    pub fn show(&self) -> Result<(), HostError> {
        self.set_visible(true)?;
        self.focus()
    }

    /// Show without taking focus.
    pub fn show_inactive(&self) -> Result<(), HostError> {
        self.set_visible(true)?;
        self.move_top()
    }

    pub fn hide(&self) -> Result<(), HostError> {
        self.set_visible(false)?;
        self.blur()
    }

    pub fn is_visible(&self) -> Result<bool, HostError> {
        Ok(self.data()?.visible)
    }

    fn set_visible(&self, visible: bool) -> Result<(), HostError> {
        {
            let mut data = self.data()?;
            if data.visible == visible {
                return Ok(());
            }
            data.visible = visible;
        }
        self.emit([WindowEvent::VisibilityChanged {
            window_id: self.inner.id,
            visible,
        }]);
        Ok(())
    }

    // -- Focus and stacking --

    /// Focus the window and raise it within its tier. The previously
    /// focused window is blurred.
    pub fn focus(&self) -> Result<(), HostError> {
        self.data()?;
        if let Some(shared) = self.manager() {
            if let Some(previous) = shared.focus(self.inner.id) {
                previous.mark_focused(false);
            }
        }
        self.mark_focused(true);
        Ok(())
    }

    pub fn blur(&self) -> Result<(), HostError> {
        self.data()?;
        if let Some(shared) = self.manager() {
            shared.blur(self.inner.id);
        }
        self.mark_focused(false);
        Ok(())
    }

    pub fn is_focused(&self) -> Result<bool, HostError> {
        Ok(self.data()?.focused)
    }

    /// Raise within the window's tier without changing focus.
    pub fn move_top(&self) -> Result<(), HostError> {
        self.data()?;
        if let Some(shared) = self.manager() {
            shared.raise(self.inner.id);
        }
        Ok(())
    }

    fn mark_focused(&self, focused: bool) {
        {
            let Ok(mut data) = self.data() else {
                return;
            };
            if data.focused == focused {
                return;
            }
            data.focused = focused;
        }
        let result = if focused {
            self.inner.content.focus()
        } else {
            self.inner.content.blur()
        };
        if let Err(e) = result {
            debug!(window_id = %self.inner.id, error = %e, "Content focus not updated");
        }
        self.emit([WindowEvent::FocusChanged {
            window_id: self.inner.id,
            focused,
        }]);
    }
}
