//! Observable content-process states.

use serde::{Deserialize, Serialize};

/// Document load progress. Print, save and find wait for `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    #[default]
    Idle,
    LoadingMainFrame,
    LoadingSubframe,
}

impl LoadState {
    pub fn is_settled(self) -> bool {
        self == Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevToolsState {
    #[default]
    Closed,
    Opened,
    OpenedAndFocused,
}

/// `audible` is what the engine observes; `muted` is the host override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioState {
    pub muted: bool,
    pub audible: bool,
}

impl AudioState {
    /// Sound is actually reaching the user.
    pub fn is_heard(&self) -> bool {
        self.audible && !self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_is_settled() {
        assert!(LoadState::Idle.is_settled());
        assert!(!LoadState::LoadingMainFrame.is_settled());
        assert!(!LoadState::LoadingSubframe.is_settled());
    }

    #[test]
    fn muted_audio_is_not_heard() {
        let audio = AudioState {
            muted: true,
            audible: true,
        };
        assert!(!audio.is_heard());
        assert!(AudioState { muted: false, audible: true }.is_heard());
    }

    #[test]
    fn states_serialize_kebab_case() {
        let json = serde_json::to_string(&LoadState::LoadingMainFrame).unwrap();
        assert_eq!(json, "\"loading-main-frame\"");
        let json = serde_json::to_string(&DevToolsState::OpenedAndFocused).unwrap();
        assert_eq!(json, "\"opened-and-focused\"");
    }
}
