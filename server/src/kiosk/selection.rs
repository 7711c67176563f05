//! The session selection state machine of a kiosk station.
//!
//! ```text
//! Loading ──┬─ 0 sessions ──> NoActiveSession ── create ──> Selected
//!           ├─ 1 session  ──> Selected
//!           └─ n sessions ──> MultipleActive ── choose ──> Selected
//! Selected ── switch ──> MultipleActive (n > 1) | ChooseEventType (n = 1)
//! MultipleActive ── switch ──> ChooseEventType ── cancel ──> previous state
//! ```
use ffw_checkin_api_types::sessions::ActiveSession;
use ffw_checkin_api_types::SessionId;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    /// The active sessions have not been fetched yet
    Loading,
    /// No session is running. The event type buttons for creating one are shown.
    NoActiveSession,
    /// The user asked to create another session while `return_to` was selected
    ChooseEventType { return_to: Option<SessionId> },
    /// More than one session is running and the user has to pick one
    MultipleActive,
    Selected {
        session_id: SessionId,
        /// Whether other sessions are running, to switch to
        switchable: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SessionSelection {
    state: SelectionState,
    sessions: Vec<ActiveSession>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSession(pub SessionId);

impl Display for UnknownSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session {} ist nicht aktiv", self.0)
    }
}

impl Default for SessionSelection {
    fn default() -> Self {
        Self {
            state: SelectionState::Loading,
            sessions: Vec::new(),
        }
    }
}

impl SessionSelection {
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// All currently active sessions, as last loaded
    pub fn sessions(&self) -> &[ActiveSession] {
        &self.sessions
    }

    pub fn selected(&self) -> Option<&ActiveSession> {
        match self.state {
            SelectionState::Selected { session_id, .. } => {
                self.sessions.iter().find(|s| s.id == session_id)
            }
            _ => None,
        }
    }

    /// Update the list of active sessions. Returns true if the state has changed.
    pub fn sessions_loaded(&mut self, sessions: Vec<ActiveSession>) -> bool {
        let previous = self.state.clone();
        self.sessions = sessions;
        let contains = |id: SessionId| self.sessions.iter().any(|s| s.id == id);
        self.state = match previous {
            SelectionState::Selected { session_id, .. } if contains(session_id) => {
                SelectionState::Selected {
                    session_id,
                    switchable: self.sessions.len() > 1,
                }
            }
            SelectionState::MultipleActive if self.sessions.len() > 1 => {
                SelectionState::MultipleActive
            }
            SelectionState::ChooseEventType { return_to } => SelectionState::ChooseEventType {
                return_to: return_to.filter(|id| contains(*id)),
            },
            _ => self.fallback_state(),
        };
        self.state != previous
    }

    pub fn choose(&mut self, session_id: SessionId) -> Result<(), UnknownSession> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(UnknownSession(session_id));
        }
        self.state = SelectionState::Selected {
            session_id,
            switchable: self.sessions.len() > 1,
        };
        Ok(())
    }

    /// Leave the selected session: pick another one from the list, or create a new one if no other
    /// session is running.
    pub fn request_switch(&mut self) {
        self.state = match self.state {
            SelectionState::Selected { .. } if self.sessions.len() > 1 => {
                SelectionState::MultipleActive
            }
            SelectionState::Selected { session_id, .. } => SelectionState::ChooseEventType {
                return_to: Some(session_id),
            },
            SelectionState::MultipleActive => SelectionState::ChooseEventType { return_to: None },
            ref state => state.clone(),
        };
    }

    /// Abort the creation of an additional session
    pub fn cancel_creation(&mut self) {
        if let SelectionState::ChooseEventType { return_to } = self.state {
            self.state = match return_to {
                Some(session_id) => SelectionState::Selected {
                    session_id,
                    switchable: self.sessions.len() > 1,
                },
                None => self.fallback_state(),
            };
        }
    }

    pub fn session_created(&mut self, session: ActiveSession) {
        let session_id = session.id;
        if !self.sessions.iter().any(|s| s.id == session_id) {
            self.sessions.push(session);
        }
        self.state = SelectionState::Selected {
            session_id,
            switchable: self.sessions.len() > 1,
        };
    }

    fn fallback_state(&self) -> SelectionState {
        match self.sessions.as_slice() {
            [] => SelectionState::NoActiveSession,
            [single] => SelectionState::Selected {
                session_id: single.id,
                switchable: false,
            },
            _ => SelectionState::MultipleActive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ffw_checkin_api_types::sessions::EventType;

    fn session(id: SessionId) -> ActiveSession {
        ActiveSession {
            id,
            event_type: EventType::Uebungsdienst,
            started_at: NaiveDate::from_ymd_opt(2025, 5, 1)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap()
                .into(),
            active_personnel: vec![],
        }
    }

    #[test]
    fn test_no_session_prompts_creation() {
        let mut selection = SessionSelection::default();
        assert_eq!(selection.state(), &SelectionState::Loading);
        assert!(selection.sessions_loaded(vec![]));
        assert_eq!(selection.state(), &SelectionState::NoActiveSession);
        selection.session_created(session(7));
        assert_eq!(selection.selected().map(|s| s.id), Some(7));
    }

    #[test]
    fn test_single_session_is_auto_selected() {
        let mut selection = SessionSelection::default();
        selection.sessions_loaded(vec![session(1)]);
        assert_eq!(
            selection.state(),
            &SelectionState::Selected {
                session_id: 1,
                switchable: false
            }
        );
    }

    #[test]
    fn test_multiple_sessions_require_choice() {
        let mut selection = SessionSelection::default();
        selection.sessions_loaded(vec![session(1), session(2)]);
        assert_eq!(selection.state(), &SelectionState::MultipleActive);
        assert!(!selection.sessions_loaded(vec![session(1), session(2)]));
        assert_eq!(selection.choose(5), Err(UnknownSession(5)));

        selection.choose(2).unwrap();
        assert_eq!(
            selection.state(),
            &SelectionState::Selected {
                session_id: 2,
                switchable: true
            }
        );
        // Selection survives polls as long as the session is running
        assert!(!selection.sessions_loaded(vec![session(1), session(2), session(3)]));
        assert_eq!(selection.selected().map(|s| s.id), Some(2));

        selection.request_switch();
        assert_eq!(selection.state(), &SelectionState::MultipleActive);
    }

    #[test]
    fn test_vanished_selection_falls_back() {
        let mut selection = SessionSelection::default();
        selection.sessions_loaded(vec![session(1), session(2)]);
        selection.choose(1).unwrap();

        assert!(selection.sessions_loaded(vec![session(2)]));
        assert_eq!(selection.selected().map(|s| s.id), Some(2));

        assert!(selection.sessions_loaded(vec![]));
        assert_eq!(selection.state(), &SelectionState::NoActiveSession);
    }

    #[test]
    fn test_switch_with_single_session_offers_creation() {
        let mut selection = SessionSelection::default();
        selection.sessions_loaded(vec![session(1)]);
        selection.request_switch();
        assert_eq!(
            selection.state(),
            &SelectionState::ChooseEventType { return_to: Some(1) }
        );
        assert!(!selection.sessions_loaded(vec![session(1)]));

        selection.cancel_creation();
        assert_eq!(selection.selected().map(|s| s.id), Some(1));
    }

    #[test]
    fn test_creation_from_session_choice() {
        let mut selection = SessionSelection::default();
        selection.sessions_loaded(vec![session(1), session(2)]);
        selection.request_switch();
        assert_eq!(
            selection.state(),
            &SelectionState::ChooseEventType { return_to: None }
        );
        selection.cancel_creation();
        assert_eq!(selection.state(), &SelectionState::MultipleActive);

        selection.request_switch();
        selection.session_created(session(3));
        assert_eq!(
            selection.state(),
            &SelectionState::Selected {
                session_id: 3,
                switchable: true
            }
        );
    }
}
