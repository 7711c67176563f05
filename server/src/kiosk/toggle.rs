//! The check-in/check-out toggle of the kiosk keypad.
//!
//! The decision between check-in and check-out is taken from the local [PresenceSnapshot]. It only
//! chooses which backend call to issue; the backend is the authority for the at-most-one-open
//! attendance rule, and its answer is displayed as-is.
use crate::backend::{AttendanceBackend, BackendError};
use crate::kiosk::snapshot::PresenceSnapshot;
use ffw_checkin_api_types::attendance::AttendanceRequest;
use ffw_checkin_api_types::SessionId;
use log::{info, warn};
use std::fmt::{Display, Formatter};

const GENERIC_FAILURE_MESSAGE: &str = "Fehler beim Check-in/out";

/// A syntactically valid Stammrollennummer, as entered on the keypad: 3 to 10 ASCII digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelNumber(String);

impl PersonnelNumber {
    pub fn parse(input: &str) -> Result<Self, InvalidPersonnelNumber> {
        let value = input.trim();
        if !(3..=10).contains(&value.len()) || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPersonnelNumber);
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersonnelNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPersonnelNumber;

impl Display for InvalidPersonnelNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Bitte eine Stammrollennummer mit 3 bis 10 Ziffern eingeben")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    CheckIn,
    CheckOut,
}

pub fn decide_action(number: &PersonnelNumber, snapshot: &PresenceSnapshot) -> ToggleAction {
    if snapshot.contains(number.as_str()) {
        ToggleAction::CheckOut
    } else {
        ToggleAction::CheckIn
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceOutcome {
    CheckedIn { message: String },
    CheckedOut { message: String },
    Failed { action: ToggleAction, message: String },
}

impl AttendanceOutcome {
    pub fn message(&self) -> &str {
        match self {
            AttendanceOutcome::CheckedIn { message }
            | AttendanceOutcome::CheckedOut { message }
            | AttendanceOutcome::Failed { message, .. } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, AttendanceOutcome::Failed { .. })
    }
}

/// Issue the check-in or check-out call for `number`, as decided from the `snapshot`, and turn the
/// result into the message to show on the kiosk.
pub async fn submit_attendance(
    backend: &dyn AttendanceBackend,
    session_id: SessionId,
    number: &PersonnelNumber,
    snapshot: &PresenceSnapshot,
) -> AttendanceOutcome {
    let action = decide_action(number, snapshot);
    let request = AttendanceRequest {
        session_id,
        stammrollennummer: number.as_str().to_owned(),
    };
    let result = match action {
        ToggleAction::CheckIn => backend.check_in(&request).await.map(|response| {
            AttendanceOutcome::CheckedIn {
                message: format!(
                    "Willkommen {} {}!",
                    response.personnel.vorname, response.personnel.nachname
                ),
            }
        }),
        ToggleAction::CheckOut => backend
            .check_out(&request)
            .await
            .map(|_| AttendanceOutcome::CheckedOut {
                message: "Erfolgreich ausgecheckt!".to_owned(),
            }),
    };
    match result {
        Ok(outcome) => {
            info!("{:?} of {} in session {}", action, number, session_id);
            outcome
        }
        Err(e) => {
            log_failure(&e, action, session_id);
            AttendanceOutcome::Failed {
                action,
                message: e.user_message(GENERIC_FAILURE_MESSAGE).to_owned(),
            }
        }
    }
}

fn log_failure(error: &BackendError, action: ToggleAction, session_id: SessionId) {
    if error.is_business_error() {
        info!("{:?} in session {} rejected: {}", action, session_id, error);
    } else {
        warn!("{:?} in session {} failed: {}", action, session_id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::sample_data::{self, SESSION_UEBUNG};
    use crate::backend::mock::BackendMock;
    use ffw_checkin_api_types::attendance::PresentPersonnel;

    fn present(number: &str) -> PresentPersonnel {
        PresentPersonnel {
            attendance_id: Some(1),
            personnel_id: 1,
            stammrollennummer: number.to_owned(),
            vorname: "Test".to_owned(),
            nachname: "Person".to_owned(),
            dienstgrad: "FM".to_owned(),
            dienstgrad_name: String::new(),
            checked_in_at: sample_data::date_time(2025, 5, 1, 18, 0).into(),
        }
    }

    fn snapshot_of(numbers: &[&str]) -> PresenceSnapshot {
        let mut snapshot = PresenceSnapshot::default();
        snapshot.replace(numbers.iter().map(|n| present(n)).collect());
        snapshot
    }

    #[test]
    fn test_parse_personnel_number() {
        assert_eq!(PersonnelNumber::parse(" 1042 ").unwrap().as_str(), "1042");
        assert!(PersonnelNumber::parse("123").is_ok());
        assert!(PersonnelNumber::parse("1234567890").is_ok());
        assert!(PersonnelNumber::parse("12").is_err());
        assert!(PersonnelNumber::parse("12345678901").is_err());
        assert!(PersonnelNumber::parse("12a4").is_err());
        assert!(PersonnelNumber::parse("").is_err());
        assert!(PersonnelNumber::parse("１２３").is_err());
    }

    #[test]
    fn test_decide_action() {
        let snapshot = snapshot_of(&["3077", "4100", "5000"]);
        assert_eq!(
            decide_action(&PersonnelNumber::parse("1042").unwrap(), &snapshot),
            ToggleAction::CheckIn
        );
        assert_eq!(
            decide_action(&PersonnelNumber::parse("4100").unwrap(), &snapshot),
            ToggleAction::CheckOut
        );
    }

    #[tokio::test]
    async fn test_submit_unknown_number_checks_in() {
        let mock = sample_data::backend_with_sample_data();
        let snapshot = snapshot_of(&["3077", "4100", "5000"]);
        let outcome = submit_attendance(
            &mock,
            SESSION_UEBUNG,
            &PersonnelNumber::parse("1042").unwrap(),
            &snapshot,
        )
        .await;
        assert_eq!(
            outcome,
            AttendanceOutcome::CheckedIn {
                message: "Willkommen Anna Schmidt!".to_owned()
            }
        );
        assert_eq!(mock.call_count("check_in"), 1);
        assert_eq!(mock.call_count("check_out"), 0);
    }

    #[tokio::test]
    async fn test_submit_present_number_checks_out() {
        let mock = sample_data::backend_with_sample_data();
        let snapshot = snapshot_of(&["3077"]);
        let outcome = submit_attendance(
            &mock,
            SESSION_UEBUNG,
            &PersonnelNumber::parse("3077").unwrap(),
            &snapshot,
        )
        .await;
        assert_eq!(outcome.message(), "Erfolgreich ausgecheckt!");
        assert_eq!(mock.call_count("check_out"), 1);
        assert_eq!(mock.call_count("check_in"), 0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_shows_backend_detail() {
        let mock = sample_data::backend_with_sample_data();
        // Carla (3077) is checked in, but the snapshot does not know yet
        let outcome = submit_attendance(
            &mock,
            SESSION_UEBUNG,
            &PersonnelNumber::parse("3077").unwrap(),
            &PresenceSnapshot::default(),
        )
        .await;
        assert_eq!(
            outcome,
            AttendanceOutcome::Failed {
                action: ToggleAction::CheckIn,
                message: "Bereits eingecheckt".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_unexpected_failure_shows_generic_message() {
        let mock = BackendMock::default();
        mock.data.lock().unwrap().next_error =
            Some(BackendError::ConnectionError("timeout".to_owned()));
        let outcome = submit_attendance(
            &mock,
            SESSION_UEBUNG,
            &PersonnelNumber::parse("1042").unwrap(),
            &PresenceSnapshot::default(),
        )
        .await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Fehler beim Check-in/out");
    }
}
