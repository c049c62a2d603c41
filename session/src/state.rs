//! Session modes and their allowed transitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The mode a session is in. Exactly one is active at a time.
///
/// ```text
///          start(Live)           start(Playback)
///   Live ◄──────────── Idle ────────────────► Playback
///        ────────────►      ◄────────────────
///          stop(Live)            stop(Playback)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Live,
    Playback,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Live => "live",
            SessionState::Playback => "playback",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Reports whether moving from `self` to `to` is allowed.
    pub fn can_transition(&self, to: SessionState) -> bool {
        matches!(
            (self, to),
            (SessionState::Idle, SessionState::Live)
                | (SessionState::Idle, SessionState::Playback)
                | (SessionState::Live, SessionState::Idle)
                | (SessionState::Playback, SessionState::Idle)
        )
    }

    /// Enters `mode` from idle.
    pub fn start(self, mode: SessionState) -> Result<SessionState, SessionError> {
        if self.can_transition(mode) && !mode.is_idle() {
            Ok(mode)
        } else {
            Err(SessionError::Busy { state: self })
        }
    }

    /// Leaves `mode` back to idle.
    pub fn stop(self, mode: SessionState) -> Result<SessionState, SessionError> {
        if self == mode && self.can_transition(SessionState::Idle) {
            Ok(SessionState::Idle)
        } else {
            Err(SessionError::NotActive { mode, state: self })
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use SessionState::*;
        assert_eq!(Idle.start(Live).unwrap(), Live);
        assert_eq!(Idle.start(Playback).unwrap(), Playback);
        assert_eq!(Live.stop(Live).unwrap(), Idle);
        assert_eq!(Playback.stop(Playback).unwrap(), Idle);
    }

    #[test]
    fn test_rejected_transitions() {
        use SessionState::*;
        assert!(matches!(Live.start(Playback), Err(SessionError::Busy { state: Live })));
        assert!(matches!(Playback.start(Live), Err(SessionError::Busy { state: Playback })));
        assert!(matches!(Live.start(Live), Err(SessionError::Busy { .. })));
        assert!(matches!(Idle.start(Idle), Err(SessionError::Busy { .. })));

        assert!(matches!(
            Idle.stop(Live),
            Err(SessionError::NotActive { mode: Live, state: Idle })
        ));
        assert!(matches!(
            Live.stop(Playback),
            Err(SessionError::NotActive { mode: Playback, state: Live })
        ));
        assert!(Idle.stop(Idle).is_err());
    }

    #[test]
    fn test_display_and_serde_names_match() {
        for state in [SessionState::Idle, SessionState::Live, SessionState::Playback] {
            assert_eq!(state.to_string(), state.as_str());
        }
        assert!(SessionState::default().is_idle());
    }
}
