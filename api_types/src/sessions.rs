use crate::attendance::PresentPersonnel;
use crate::{AttendanceId, PersonnelId, SessionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "Einsatz")]
    Einsatz,
    #[serde(rename = "Übungsdienst")]
    Uebungsdienst,
    #[serde(rename = "Arbeitsdienst-A")]
    ArbeitsdienstA,
    #[serde(rename = "Arbeitsdienst-B")]
    ArbeitsdienstB,
    #[serde(rename = "Arbeitsdienst-C")]
    ArbeitsdienstC,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Einsatz,
        EventType::Uebungsdienst,
        EventType::ArbeitsdienstA,
        EventType::ArbeitsdienstB,
        EventType::ArbeitsdienstC,
    ];

    /// Name as used on the wire and in the UI
    pub fn name(&self) -> &'static str {
        match self {
            EventType::Einsatz => "Einsatz",
            EventType::Uebungsdienst => "Übungsdienst",
            EventType::ArbeitsdienstA => "Arbeitsdienst-A",
            EventType::ArbeitsdienstB => "Arbeitsdienst-B",
            EventType::ArbeitsdienstC => "Arbeitsdienst-C",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Ending a session of this type at the kiosk requires a minimum rank
    pub fn requires_rank_to_end(&self) -> bool {
        matches!(self, EventType::Einsatz)
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Entry of `GET /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub event_type: EventType,
    pub started_at: Timestamp,
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
    pub is_active: bool,
    #[serde(default)]
    pub total_attendees: u32,
    #[serde(default)]
    pub active_attendees: u32,
}

/// Query parameters of `GET /sessions`
#[derive(Debug, Clone, Serialize)]
pub struct SessionsQuery {
    pub active_only: bool,
    pub skip: u32,
    pub limit: u32,
}

impl Default for SessionsQuery {
    fn default() -> Self {
        Self {
            active_only: false,
            skip: 0,
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAttendance {
    pub id: AttendanceId,
    pub personnel_id: PersonnelId,
    pub stammrollennummer: String,
    pub vorname: String,
    pub nachname: String,
    pub dienstgrad: String,
    #[serde(default)]
    pub dienstgrad_name: String,
    pub checked_in_at: Timestamp,
    #[serde(default)]
    pub checked_out_at: Option<Timestamp>,
}

impl SessionAttendance {
    pub fn is_present(&self) -> bool {
        self.checked_out_at.is_none()
    }

    /// Duration of the attendance in minutes, if the person has checked out
    pub fn duration_minutes(&self) -> Option<i64> {
        self.checked_out_at
            .map(|out| (out.naive() - self.checked_in_at.naive()).num_minutes())
    }
}

/// Response of `GET /sessions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub id: SessionId,
    pub event_type: EventType,
    pub started_at: Timestamp,
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
    pub is_active: bool,
    #[serde(default)]
    pub attendances: Vec<SessionAttendance>,
}

impl SessionDetail {
    pub fn active_attendees(&self) -> usize {
        self.attendances.iter().filter(|a| a.is_present()).count()
    }
}

/// Body of `POST /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub event_type: EventType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: SessionId,
    pub event_type: EventType,
    pub started_at: Timestamp,
    pub is_active: bool,
}

/// Entry of `GET /sessions/active/current`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: SessionId,
    pub event_type: EventType,
    pub started_at: Timestamp,
    #[serde(default)]
    pub active_personnel: Vec<PresentPersonnel>,
}

impl From<CreatedSession> for ActiveSession {
    fn from(value: CreatedSession) -> Self {
        Self {
            id: value.id,
            event_type: value.event_type,
            started_at: value.started_at,
            active_personnel: vec![],
        }
    }
}

/// Optional body of `POST /sessions/{id}/end`
///
/// When a session is ended at the kiosk, the personnel number of a sufficiently ranked member is
/// forwarded instead of an admin token, and the backend checks the rank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stammrollennummer: Option<String>,
}
