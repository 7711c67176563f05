use crate::{AttendanceId, PersonnelId, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

/// Body of `POST /attendance/checkin` and `POST /attendance/checkout`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub session_id: SessionId,
    pub stammrollennummer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelName {
    #[serde(default)]
    pub id: Option<PersonnelId>,
    pub vorname: String,
    pub nachname: String,
    #[serde(default)]
    pub dienstgrad: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub message: String,
    pub attendance_id: AttendanceId,
    pub personnel: PersonnelName,
    pub checked_in_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutResponse {
    pub message: String,
    pub personnel: PersonnelName,
    pub checked_out_at: Timestamp,
}

/// A person with an open attendance in a session
///
/// Returned by `GET /attendance/session/{id}/active` and embedded into the active session list
/// (`GET /sessions/active/current`). The latter names the personnel id `id` and does not include
/// the attendance id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentPersonnel {
    #[serde(default)]
    pub attendance_id: Option<AttendanceId>,
    #[serde(alias = "id")]
    pub personnel_id: PersonnelId,
    pub stammrollennummer: String,
    pub vorname: String,
    pub nachname: String,
    pub dienstgrad: String,
    #[serde(default)]
    pub dienstgrad_name: String,
    pub checked_in_at: Timestamp,
}

/// Body of `POST /checkin/validate-token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}
