//! Find-in-page session state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindOptions {
    /// Search direction when advancing.
    pub forward: bool,
    /// Continue the current session instead of starting a new one.
    pub find_next: bool,
    pub match_case: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            forward: true,
            find_next: false,
            match_case: false,
        }
    }
}

impl FindOptions {
    pub fn next() -> Self {
        Self {
            find_next: true,
            ..Self::default()
        }
    }

    pub fn previous() -> Self {
        Self {
            forward: false,
            find_next: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    pub request_id: u32,
    pub matches: usize,
    /// 1-based; 0 when there are no matches.
    pub active_match_ordinal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopFindAction {
    #[default]
    ClearSelection,
    KeepSelection,
    ActivateSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FindSession {
    pub(crate) text: String,
    pub(crate) match_case: bool,
    pub(crate) matches: usize,
    pub(crate) active: usize,
}

impl FindSession {
    pub(crate) fn start(text: &str, match_case: bool, matches: usize, forward: bool) -> Self {
        let active = match (matches, forward) {
            (0, _) => 0,
            (_, true) => 1,
            (n, false) => n,
        };
        Self {
            text: text.to_string(),
            match_case,
            matches,
            active,
        }
    }

    pub(crate) fn continues(&self, text: &str, options: &FindOptions) -> bool {
        options.find_next && self.text == text && self.match_case == options.match_case
    }

    /// Step the active match, wrapping at either end. `matches` is the
    /// fresh count; the document may have changed since the last step.
    pub(crate) fn advance(&mut self, matches: usize, forward: bool) {
        self.matches = matches;
        if matches == 0 {
            self.active = 0;
            return;
        }
        if self.active == 0 || self.active > matches {
            self.active = if forward { 1 } else { matches };
            return;
        }
        self.active = match (forward, self.active) {
            (true, n) => n % matches + 1,
            (false, 1) => matches,
            (false, n) => n - 1,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_picks_first_or_last() {
        assert_eq!(FindSession::start("a", false, 3, true).active, 1);
        assert_eq!(FindSession::start("a", false, 3, false).active, 3);
        assert_eq!(FindSession::start("a", false, 0, true).active, 0);
    }

    #[test]
    fn advance_wraps_forward() {
        let mut session = FindSession::start("a", false, 3, true);
        session.advance(3, true);
        assert_eq!(session.active, 2);
        session.advance(3, true);
        assert_eq!(session.active, 3);
        session.advance(3, true);
        assert_eq!(session.active, 1);
    }

    #[test]
    fn advance_wraps_backward() {
        let mut session = FindSession::start("a", false, 2, true);
        session.advance(2, false);
        assert_eq!(session.active, 2);
        session.advance(2, false);
        assert_eq!(session.active, 1);
    }

    #[test]
    fn advance_clamps_when_matches_shrink() {
        let mut session = FindSession::start("a", false, 5, false);
        assert_eq!(session.active, 5);
        session.advance(2, true);
        assert_eq!(session.active, 1);
        session.advance(0, true);
        assert_eq!(session.active, 0);
    }

    #[test]
    fn continuation_requires_same_term_and_case() {
        let session = FindSession::start("term", false, 1, true);
        assert!(session.continues("term", &FindOptions::next()));
        assert!(!session.continues("term", &FindOptions::default()));
        assert!(!session.continues("other", &FindOptions::next()));
        let case_sensitive = FindOptions {
            match_case: true,
            ..FindOptions::next()
        };
        assert!(!session.continues("term", &case_sensitive));
    }
}
