use crate::backend::{
    AttendanceBackend, BackendError, BinaryFile, EndSessionAuthorization, EventStream,
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime};
use ffw_checkin_api_types::attendance::{
    AttendanceRequest, CheckInResponse, CheckOutResponse, PersonnelName, PresentPersonnel,
    TokenValidation,
};
use ffw_checkin_api_types::audit::{AuditEntry, AuditFilter, AuditPage};
use ffw_checkin_api_types::auth::{AdminUser, LoginResponse};
use ffw_checkin_api_types::backup::{BackupCreated, BackupFile};
use ffw_checkin_api_types::content::{Announcement, AnnouncementData, News, NewsData};
use ffw_checkin_api_types::personnel::{Personnel, PersonnelData, Rank};
use ffw_checkin_api_types::sessions::{
    ActiveSession, CreatedSession, EventType, SessionAttendance, SessionDetail, SessionSummary,
    SessionsQuery,
};
use ffw_checkin_api_types::settings::{
    BackupSettings, PathValidation, StationSettings, SystemSettings,
};
use ffw_checkin_api_types::statistics::{
    PersonnelRef, PersonnelSummary, PersonnelYearly, UnitSummary, UnitYearly,
};
use ffw_checkin_api_types::system::{HealthStatus, UpdateResult, VersionInfo};
use ffw_checkin_api_types::{
    AnnouncementId, AttendanceId, MessageResponse, NewsId, PersonnelId, SessionId, Timestamp,
};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub mod sample_data;

pub const ADMIN_TOKEN: &str = "admin-token";

/**
 * A mock [AttendanceBackend] implementation for testing.
 *
 * The simulated backend consists of the [BackendMockData] structure with vectors of entities. These
 * can be directly modified by the tests. Like the real backend, the mock decides check-in/check-out
 * conflicts, admin tokens and the rank required for ending an "Einsatz" on its own.
 *
 * Every call is recorded in [BackendMockData.calls]. The [BackendMockData.next_error] attribute can
 * be set to simulate a failure of the next call.
 */
#[derive(Default)]
pub struct BackendMock {
    pub data: Mutex<BackendMockData>,
}

#[derive(Clone)]
pub struct MockSession {
    pub id: SessionId,
    pub event_type: EventType,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct MockAttendance {
    pub id: AttendanceId,
    pub session_id: SessionId,
    pub personnel_id: PersonnelId,
    pub checked_in_at: NaiveDateTime,
    pub checked_out_at: Option<NaiveDateTime>,
}

pub struct BackendMockData {
    pub sessions: Vec<MockSession>,
    pub personnel: Vec<Personnel>,
    pub attendances: Vec<MockAttendance>,
    pub announcements: Vec<Announcement>,
    pub news: Vec<News>,
    pub station: StationSettings,
    pub system: SystemSettings,
    pub backup_settings: BackupSettings,
    pub backups: Vec<BackupFile>,
    pub audit: Vec<AuditEntry>,
    pub version: VersionInfo,
    /// QR tokens accepted by `validate_qr_token` and their sessions
    pub qr_tokens: Vec<(String, SessionId)>,
    /// Chunks delivered by the next `event_stream` subscription
    pub event_chunks: Vec<String>,
    /// Simulated current time of the backend
    pub now: NaiveDateTime,
    /// Names of all called interface functions, in order
    pub calls: Vec<String>,
    /// If not none, the next call to a backend method will return this error.
    pub next_error: Option<BackendError>,
    next_id: i32,
}

impl Default for BackendMockData {
    fn default() -> Self {
        Self {
            sessions: vec![],
            personnel: vec![],
            attendances: vec![],
            announcements: vec![],
            news: vec![],
            station: StationSettings::default(),
            system: SystemSettings::default(),
            backup_settings: BackupSettings::default(),
            backups: vec![],
            audit: vec![],
            version: VersionInfo {
                current_version: "v1.4.0".to_owned(),
                current_commit: "abc1234".to_owned(),
                remote_available: true,
                updates_available: false,
                remote_commit: Some("abc1234".to_owned()),
                last_check: None,
            },
            qr_tokens: vec![],
            event_chunks: vec![],
            now: sample_data::date_time(2025, 5, 1, 19, 0),
            calls: vec![],
            next_error: None,
            next_id: 100,
        }
    }
}

impl BackendMockData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn find_personnel_by_number(&self, number: &str) -> Result<Personnel, BackendError> {
        self.personnel
            .iter()
            .find(|p| p.stammrollennummer == number)
            .cloned()
            .ok_or(BackendError::NotExisting {
                detail: Some("Personal nicht gefunden".to_owned()),
            })
    }

    fn find_session(&self, id: SessionId) -> Result<&MockSession, BackendError> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or(BackendError::NotExisting {
                detail: Some("Session nicht gefunden".to_owned()),
            })
    }

    fn present_in(&self, session_id: SessionId) -> Vec<PresentPersonnel> {
        self.attendances
            .iter()
            .filter(|a| a.session_id == session_id && a.checked_out_at.is_none())
            .filter_map(|a| {
                let p = self.personnel.iter().find(|p| p.id == a.personnel_id)?;
                Some(PresentPersonnel {
                    attendance_id: Some(a.id),
                    personnel_id: p.id,
                    stammrollennummer: p.stammrollennummer.clone(),
                    vorname: p.vorname.clone(),
                    nachname: p.nachname.clone(),
                    dienstgrad: p.dienstgrad.clone(),
                    dienstgrad_name: p.dienstgrad_name.clone(),
                    checked_in_at: a.checked_in_at.into(),
                })
            })
            .collect()
    }

    fn summary(&self, session: &MockSession) -> SessionSummary {
        let attendances = self.attendances.iter().filter(|a| a.session_id == session.id);
        SessionSummary {
            id: session.id,
            event_type: session.event_type,
            started_at: session.started_at.into(),
            ended_at: session.ended_at.map(Into::into),
            is_active: session.is_active,
            total_attendees: attendances.clone().count() as u32,
            active_attendees: attendances.filter(|a| a.checked_out_at.is_none()).count() as u32,
        }
    }

    fn check_admin(&self, token: &str) -> Result<(), BackendError> {
        if token == ADMIN_TOKEN {
            Ok(())
        } else {
            Err(BackendError::Unauthenticated)
        }
    }
}

impl BackendMock {
    /// Lock the mock data, record the call and return the simulated error, if one is set
    fn begin(&self, call: &str) -> Result<MutexGuard<'_, BackendMockData>, BackendError> {
        let mut data = self.data.lock().expect("Error while locking mutex.");
        data.calls.push(call.to_owned());
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        Ok(data)
    }

    fn begin_admin(
        &self,
        call: &str,
        token: &str,
    ) -> Result<MutexGuard<'_, BackendMockData>, BackendError> {
        let data = self.begin(call)?;
        data.check_admin(token)?;
        Ok(data)
    }

    /// Number of calls of the given interface function
    pub fn call_count(&self, call: &str) -> usize {
        self.data
            .lock()
            .expect("Error while locking mutex.")
            .calls
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    fn binary(content_type: &str, filename: &str) -> BinaryFile {
        BinaryFile {
            content_type: content_type.to_owned(),
            filename: Some(filename.to_owned()),
            data: filename.as_bytes().to_vec(),
        }
    }
}

fn message(text: &str) -> MessageResponse {
    MessageResponse {
        message: text.to_owned(),
    }
}

fn not_found() -> BackendError {
    BackendError::NotExisting { detail: None }
}

#[async_trait]
impl AttendanceBackend for BackendMock {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, BackendError> {
        let _data = self.begin("login")?;
        if username == "admin" && password == "geheim" {
            Ok(LoginResponse {
                access_token: ADMIN_TOKEN.to_owned(),
                token_type: "bearer".to_owned(),
                user: AdminUser {
                    id: 1,
                    username: "admin".to_owned(),
                    role: "admin".to_owned(),
                },
            })
        } else {
            Err(BackendError::Unauthenticated)
        }
    }

    async fn current_user(&self, token: &str) -> Result<AdminUser, BackendError> {
        let _data = self.begin_admin("current_user", token)?;
        Ok(AdminUser {
            id: 1,
            username: "admin".to_owned(),
            role: "admin".to_owned(),
        })
    }

    async fn active_sessions(&self) -> Result<Vec<ActiveSession>, BackendError> {
        let data = self.begin("active_sessions")?;
        Ok(data
            .sessions
            .iter()
            .filter(|s| s.is_active)
            .map(|s| ActiveSession {
                id: s.id,
                event_type: s.event_type,
                started_at: s.started_at.into(),
                active_personnel: data
                    .present_in(s.id)
                    .into_iter()
                    .map(|p| PresentPersonnel {
                        attendance_id: None,
                        ..p
                    })
                    .collect(),
            })
            .collect())
    }

    async fn session_presence(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PresentPersonnel>, BackendError> {
        let data = self.begin("session_presence")?;
        data.find_session(session_id)?;
        Ok(data.present_in(session_id))
    }

    async fn check_in(
        &self,
        request: &AttendanceRequest,
    ) -> Result<CheckInResponse, BackendError> {
        let mut data = self.begin("check_in")?;
        let personnel = data.find_personnel_by_number(&request.stammrollennummer)?;
        if !personnel.is_active {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Personal ist nicht aktiv".to_owned(),
            });
        }
        if !data.find_session(request.session_id)?.is_active {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Session ist nicht aktiv".to_owned(),
            });
        }
        if data.attendances.iter().any(|a| {
            a.session_id == request.session_id
                && a.personnel_id == personnel.id
                && a.checked_out_at.is_none()
        }) {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Bereits eingecheckt".to_owned(),
            });
        }
        let id = data.next_id();
        let now = data.now;
        data.attendances.push(MockAttendance {
            id,
            session_id: request.session_id,
            personnel_id: personnel.id,
            checked_in_at: now,
            checked_out_at: None,
        });
        Ok(CheckInResponse {
            message: "Erfolgreich eingecheckt".to_owned(),
            attendance_id: id,
            personnel: PersonnelName {
                id: Some(personnel.id),
                vorname: personnel.vorname,
                nachname: personnel.nachname,
                dienstgrad: Some(personnel.dienstgrad),
            },
            checked_in_at: now.into(),
        })
    }

    async fn check_out(
        &self,
        request: &AttendanceRequest,
    ) -> Result<CheckOutResponse, BackendError> {
        let mut data = self.begin("check_out")?;
        let personnel = data.find_personnel_by_number(&request.stammrollennummer)?;
        let now = data.now;
        let attendance = data
            .attendances
            .iter_mut()
            .find(|a| {
                a.session_id == request.session_id
                    && a.personnel_id == personnel.id
                    && a.checked_out_at.is_none()
            })
            .ok_or(BackendError::NotExisting {
                detail: Some("Kein aktiver Check-in gefunden".to_owned()),
            })?;
        attendance.checked_out_at = Some(now);
        Ok(CheckOutResponse {
            message: "Erfolgreich ausgecheckt".to_owned(),
            personnel: PersonnelName {
                id: None,
                vorname: personnel.vorname,
                nachname: personnel.nachname,
                dienstgrad: None,
            },
            checked_out_at: now.into(),
        })
    }

    async fn validate_qr_token(&self, token: &str) -> Result<TokenValidation, BackendError> {
        let data = self.begin("validate_qr_token")?;
        let session_id = data
            .qr_tokens
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, session_id)| *session_id)
            .ok_or(BackendError::Rejected {
                status: 400,
                detail: "Ungültiger oder abgelaufener QR-Code".to_owned(),
            })?;
        if !data.find_session(session_id)?.is_active {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Session ist nicht aktiv".to_owned(),
            });
        }
        Ok(TokenValidation {
            valid: true,
            session_id: Some(session_id),
        })
    }

    async fn create_session(
        &self,
        event_type: EventType,
        token: Option<&str>,
    ) -> Result<CreatedSession, BackendError> {
        let mut data = self.begin("create_session")?;
        data.check_admin(token.unwrap_or(""))?;
        let id = data.next_id();
        let now = data.now;
        data.sessions.push(MockSession {
            id,
            event_type,
            started_at: now,
            ended_at: None,
            is_active: true,
        });
        Ok(CreatedSession {
            id,
            event_type,
            started_at: now.into(),
            is_active: true,
        })
    }

    async fn end_session(
        &self,
        session_id: SessionId,
        authorization: &EndSessionAuthorization,
    ) -> Result<MessageResponse, BackendError> {
        let mut data = self.begin("end_session")?;
        let session = data.find_session(session_id)?.clone();
        if !session.is_active {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Session ist bereits beendet".to_owned(),
            });
        }
        match authorization {
            EndSessionAuthorization::Admin(token) => data.check_admin(token)?,
            EndSessionAuthorization::Personnel(number) => {
                let personnel = data.find_personnel_by_number(number)?;
                let qualified = Rank::from_code(&personnel.dienstgrad)
                    .is_some_and(|rank| rank.may_end_emergency());
                if session.event_type.requires_rank_to_end() && !qualified {
                    return Err(BackendError::PermissionDenied {
                        detail: Some(
                            "Zum Beenden eines Einsatzes ist mindestens der Dienstgrad UBM erforderlich"
                                .to_owned(),
                        ),
                    });
                }
            }
        }
        let now = data.now;
        for attendance in data
            .attendances
            .iter_mut()
            .filter(|a| a.session_id == session_id && a.checked_out_at.is_none())
        {
            attendance.checked_out_at = Some(now);
        }
        if let Some(session) = data.sessions.iter_mut().find(|s| s.id == session_id) {
            session.is_active = false;
            session.ended_at = Some(now);
        }
        Ok(message("Session erfolgreich beendet"))
    }

    async fn active_announcements(&self) -> Result<Vec<Announcement>, BackendError> {
        let data = self.begin("active_announcements")?;
        let now: Timestamp = data.now.into();
        let mut result: Vec<Announcement> = data
            .announcements
            .iter()
            .filter(|a| a.valid_from.map_or(true, |from| from <= now))
            .filter(|a| a.valid_until.map_or(true, |until| until >= now))
            .cloned()
            .collect();
        result.sort_by_key(|a| a.priority);
        Ok(result)
    }

    async fn announcements(&self, token: &str) -> Result<Vec<Announcement>, BackendError> {
        let data = self.begin_admin("announcements", token)?;
        Ok(data.announcements.clone())
    }

    async fn announcement(
        &self,
        token: &str,
        id: AnnouncementId,
    ) -> Result<Announcement, BackendError> {
        let data = self.begin_admin("announcement", token)?;
        data.announcements
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_announcement(
        &self,
        token: &str,
        announcement: &AnnouncementData,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("create_announcement", token)?;
        let id = data.next_id();
        let now = data.now;
        data.announcements.push(Announcement {
            id,
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            priority: announcement.priority,
            valid_from: Some(announcement.valid_from.unwrap_or(now.into())),
            valid_until: announcement.valid_until,
            created_at: Some(now.into()),
        });
        Ok(())
    }

    async fn update_announcement(
        &self,
        token: &str,
        id: AnnouncementId,
        announcement: &AnnouncementData,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_announcement", token)?;
        let existing = data
            .announcements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(not_found)?;
        existing.title = announcement.title.clone();
        existing.content = announcement.content.clone();
        existing.priority = announcement.priority;
        existing.valid_from = announcement.valid_from;
        existing.valid_until = announcement.valid_until;
        Ok(())
    }

    async fn delete_announcement(
        &self,
        token: &str,
        id: AnnouncementId,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("delete_announcement", token)?;
        let len = data.announcements.len();
        data.announcements.retain(|a| a.id != id);
        if data.announcements.len() == len {
            return Err(not_found());
        }
        Ok(())
    }

    async fn news(&self, active_only: bool) -> Result<Vec<News>, BackendError> {
        let data = self.begin("news")?;
        let now: Timestamp = data.now.into();
        Ok(data
            .news
            .iter()
            .filter(|n| {
                !active_only || (n.is_active && n.expires_at.map_or(true, |exp| exp > now))
            })
            .cloned()
            .collect())
    }

    async fn news_item(&self, id: NewsId) -> Result<News, BackendError> {
        let data = self.begin("news_item")?;
        data.news
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_news(&self, token: &str, news: &NewsData) -> Result<(), BackendError> {
        let mut data = self.begin_admin("create_news", token)?;
        let id = data.next_id();
        let now = data.now;
        data.news.push(News {
            id,
            title: news.title.clone(),
            content: news.content.clone(),
            priority: news.priority,
            is_active: news.is_active,
            created_at: Some(now.into()),
            expires_at: news.expires_at,
        });
        Ok(())
    }

    async fn update_news(
        &self,
        token: &str,
        id: NewsId,
        news: &NewsData,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_news", token)?;
        let existing = data
            .news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(not_found)?;
        existing.title = news.title.clone();
        existing.content = news.content.clone();
        existing.priority = news.priority;
        existing.is_active = news.is_active;
        existing.expires_at = news.expires_at;
        Ok(())
    }

    async fn delete_news(&self, token: &str, id: NewsId) -> Result<(), BackendError> {
        let mut data = self.begin_admin("delete_news", token)?;
        let len = data.news.len();
        data.news.retain(|n| n.id != id);
        if data.news.len() == len {
            return Err(not_found());
        }
        Ok(())
    }

    async fn sessions(&self, query: &SessionsQuery) -> Result<Vec<SessionSummary>, BackendError> {
        let data = self.begin("sessions")?;
        let mut sessions: Vec<&MockSession> = data
            .sessions
            .iter()
            .filter(|s| !query.active_only || s.is_active)
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .map(|s| data.summary(s))
            .collect())
    }

    async fn session(&self, id: SessionId) -> Result<SessionDetail, BackendError> {
        let data = self.begin("session")?;
        let session = data.find_session(id)?;
        Ok(SessionDetail {
            id: session.id,
            event_type: session.event_type,
            started_at: session.started_at.into(),
            ended_at: session.ended_at.map(Into::into),
            is_active: session.is_active,
            attendances: data
                .attendances
                .iter()
                .filter(|a| a.session_id == id)
                .filter_map(|a| {
                    let p = data.personnel.iter().find(|p| p.id == a.personnel_id)?;
                    Some(SessionAttendance {
                        id: a.id,
                        personnel_id: p.id,
                        stammrollennummer: p.stammrollennummer.clone(),
                        vorname: p.vorname.clone(),
                        nachname: p.nachname.clone(),
                        dienstgrad: p.dienstgrad.clone(),
                        dienstgrad_name: p.dienstgrad_name.clone(),
                        checked_in_at: a.checked_in_at.into(),
                        checked_out_at: a.checked_out_at.map(Into::into),
                    })
                })
                .collect(),
        })
    }

    async fn delete_session(&self, token: &str, id: SessionId) -> Result<(), BackendError> {
        let mut data = self.begin_admin("delete_session", token)?;
        data.find_session(id)?;
        data.sessions.retain(|s| s.id != id);
        data.attendances.retain(|a| a.session_id != id);
        Ok(())
    }

    async fn session_qr_png(&self, id: SessionId) -> Result<BinaryFile, BackendError> {
        let data = self.begin("session_qr_png")?;
        data.find_session(id)?;
        Ok(Self::binary("image/png", &format!("session_{}_qr.png", id)))
    }

    async fn session_pdf(&self, token: &str, id: SessionId) -> Result<BinaryFile, BackendError> {
        let data = self.begin_admin("session_pdf", token)?;
        data.find_session(id)?;
        Ok(Self::binary("application/pdf", &format!("session_{}.pdf", id)))
    }

    async fn personnel(
        &self,
        token: &str,
        active_only: bool,
    ) -> Result<Vec<Personnel>, BackendError> {
        let data = self.begin_admin("personnel", token)?;
        Ok(data
            .personnel
            .iter()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect())
    }

    async fn personnel_by_id(
        &self,
        token: &str,
        id: PersonnelId,
    ) -> Result<Personnel, BackendError> {
        let data = self.begin_admin("personnel_by_id", token)?;
        data.personnel
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn personnel_by_number(
        &self,
        token: &str,
        stammrollennummer: &str,
    ) -> Result<Personnel, BackendError> {
        let data = self.begin_admin("personnel_by_number", token)?;
        data.find_personnel_by_number(stammrollennummer)
    }

    async fn create_personnel(
        &self,
        token: &str,
        personnel: &PersonnelData,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("create_personnel", token)?;
        if data
            .personnel
            .iter()
            .any(|p| p.stammrollennummer == personnel.stammrollennummer)
        {
            return Err(BackendError::Rejected {
                status: 400,
                detail: "Stammrollennummer bereits vergeben".to_owned(),
            });
        }
        let id = data.next_id();
        let now = data.now;
        data.personnel
            .push(sample_data::personnel_from_data(id, personnel, now));
        Ok(())
    }

    async fn update_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        personnel: &PersonnelData,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_personnel", token)?;
        let existing = data
            .personnel
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        *existing = sample_data::personnel_from_data(
            id,
            personnel,
            existing.created_at.map(|c| c.naive()).unwrap_or_default(),
        );
        Ok(())
    }

    async fn delete_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        permanent: bool,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("delete_personnel", token)?;
        if !data.personnel.iter().any(|p| p.id == id) {
            return Err(not_found());
        }
        if permanent {
            data.personnel.retain(|p| p.id != id);
            data.attendances.retain(|a| a.personnel_id != id);
        } else if let Some(p) = data.personnel.iter_mut().find(|p| p.id == id) {
            p.is_active = false;
        }
        Ok(())
    }

    async fn station_settings(&self) -> Result<StationSettings, BackendError> {
        let data = self.begin("station_settings")?;
        Ok(data.station.clone())
    }

    async fn update_station_settings(
        &self,
        token: &str,
        settings: &StationSettings,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_station_settings", token)?;
        let logo_path = data.station.logo_path.take();
        data.station = StationSettings {
            logo_path,
            ..settings.clone()
        };
        Ok(())
    }

    async fn station_logo(&self) -> Result<BinaryFile, BackendError> {
        let data = self.begin("station_logo")?;
        if !data.station.has_logo() {
            return Err(not_found());
        }
        Ok(Self::binary("image/png", "logo.png"))
    }

    async fn system_settings(&self) -> Result<SystemSettings, BackendError> {
        let data = self.begin("system_settings")?;
        Ok(data.system.clone())
    }

    async fn update_system_settings(
        &self,
        token: &str,
        settings: &SystemSettings,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_system_settings", token)?;
        data.system = settings.clone();
        Ok(())
    }

    async fn backup_settings(&self, token: &str) -> Result<BackupSettings, BackendError> {
        let data = self.begin_admin("backup_settings", token)?;
        Ok(data.backup_settings.clone())
    }

    async fn update_backup_settings(
        &self,
        token: &str,
        settings: &BackupSettings,
    ) -> Result<(), BackendError> {
        let mut data = self.begin_admin("update_backup_settings", token)?;
        data.backup_settings = settings.clone();
        Ok(())
    }

    async fn validate_backup_path(
        &self,
        token: &str,
        path: &str,
    ) -> Result<PathValidation, BackendError> {
        let _data = self.begin_admin("validate_backup_path", token)?;
        let valid = path.starts_with('/');
        Ok(PathValidation {
            valid,
            message: if valid {
                "Pfad ist gültig und beschreibbar".to_owned()
            } else {
                "Pfad muss absolut sein".to_owned()
            },
        })
    }

    async fn create_backup(&self, token: &str) -> Result<BackupCreated, BackendError> {
        let mut data = self.begin_admin("create_backup", token)?;
        let filename = format!("backup_{}.db", data.now.format("%Y%m%d_%H%M%S"));
        let created_at = data.now.format("%Y-%m-%dT%H:%M:%S").to_string();
        data.backups.push(BackupFile {
            filename: filename.clone(),
            size: 4096,
            created_at,
        });
        Ok(BackupCreated {
            message: "Backup erfolgreich erstellt".to_owned(),
            filename: Some(filename),
        })
    }

    async fn backups(&self, token: &str) -> Result<Vec<BackupFile>, BackendError> {
        let data = self.begin_admin("backups", token)?;
        Ok(data.backups.clone())
    }

    async fn download_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<BinaryFile, BackendError> {
        let data = self.begin_admin("download_backup", token)?;
        if !data.backups.iter().any(|b| b.filename == filename) {
            return Err(not_found());
        }
        Ok(Self::binary("application/octet-stream", filename))
    }

    async fn restore_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<MessageResponse, BackendError> {
        let data = self.begin_admin("restore_backup", token)?;
        if !data.backups.iter().any(|b| b.filename == filename) {
            return Err(not_found());
        }
        Ok(message("Backup erfolgreich wiederhergestellt"))
    }

    async fn delete_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<MessageResponse, BackendError> {
        let mut data = self.begin_admin("delete_backup", token)?;
        let len = data.backups.len();
        data.backups.retain(|b| b.filename != filename);
        if data.backups.len() == len {
            return Err(not_found());
        }
        Ok(message("Backup gelöscht"))
    }

    async fn audit_log(
        &self,
        token: &str,
        filter: &AuditFilter,
    ) -> Result<AuditPage, BackendError> {
        let data = self.begin_admin("audit_log", token)?;
        let matching: Vec<&AuditEntry> = data
            .audit
            .iter()
            .filter(|e| filter.action.as_ref().map_or(true, |a| &e.action == a))
            .filter(|e| {
                filter
                    .entity_type
                    .as_ref()
                    .map_or(true, |t| &e.entity_type == t)
            })
            .collect();
        Ok(AuditPage {
            total: matching.len() as u64,
            offset: filter.offset,
            limit: filter.limit,
            logs: matching
                .into_iter()
                .skip(filter.offset as usize)
                .take(filter.limit as usize)
                .cloned()
                .collect(),
        })
    }

    async fn audit_actions(&self, token: &str) -> Result<Vec<String>, BackendError> {
        let data = self.begin_admin("audit_actions", token)?;
        let mut actions: Vec<String> = data.audit.iter().map(|e| e.action.clone()).collect();
        actions.sort();
        actions.dedup();
        Ok(actions)
    }

    async fn audit_entity_types(&self, token: &str) -> Result<Vec<String>, BackendError> {
        let data = self.begin_admin("audit_entity_types", token)?;
        let mut types: Vec<String> = data.audit.iter().map(|e| e.entity_type.clone()).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn unit_yearly(&self, token: &str, year: i32) -> Result<UnitYearly, BackendError> {
        let data = self.begin_admin("unit_yearly", token)?;
        let sessions: Vec<&MockSession> = data
            .sessions
            .iter()
            .filter(|s| s.started_at.year() == year)
            .collect();
        let total_attendances = data
            .attendances
            .iter()
            .filter(|a| sessions.iter().any(|s| s.id == a.session_id))
            .count() as u32;
        let mut event_types = BTreeMap::new();
        for session in sessions.iter() {
            *event_types
                .entry(session.event_type.name().to_owned())
                .or_insert(0) += 1;
        }
        let total_sessions = sessions.len() as u32;
        Ok(UnitYearly {
            year,
            summary: UnitSummary {
                total_sessions,
                total_attendances,
                average_attendance_per_session: if total_sessions > 0 {
                    total_attendances as f64 / total_sessions as f64
                } else {
                    0.0
                },
                event_types,
            },
            top_personnel: vec![],
            by_rank: vec![],
            monthly: vec![],
        })
    }

    async fn unit_yearly_pdf(&self, token: &str, year: i32) -> Result<BinaryFile, BackendError> {
        let _data = self.begin_admin("unit_yearly_pdf", token)?;
        Ok(Self::binary(
            "application/pdf",
            &format!("statistik_einheit_{}.pdf", year),
        ))
    }

    async fn personnel_yearly(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<PersonnelYearly, BackendError> {
        let data = self.begin_admin("personnel_yearly", token)?;
        let personnel = data
            .personnel
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        let attendances: Vec<&MockAttendance> = data
            .attendances
            .iter()
            .filter(|a| a.personnel_id == id && a.checked_in_at.year() == year)
            .collect();
        let total_hours = attendances
            .iter()
            .filter_map(|a| a.checked_out_at.map(|out| out - a.checked_in_at))
            .map(|d| d.num_minutes() as f64 / 60.0)
            .sum();
        Ok(PersonnelYearly {
            personnel: PersonnelRef {
                id: personnel.id,
                stammrollennummer: personnel.stammrollennummer.clone(),
                vorname: personnel.vorname.clone(),
                nachname: personnel.nachname.clone(),
                dienstgrad: personnel.dienstgrad.clone(),
            },
            year,
            summary: PersonnelSummary {
                total_sessions: attendances.len() as u32,
                total_hours,
                attendance_rate: 0.0,
                event_types: BTreeMap::new(),
            },
            monthly: vec![],
        })
    }

    async fn personnel_yearly_pdf(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<BinaryFile, BackendError> {
        let _data = self.begin_admin("personnel_yearly_pdf", token)?;
        Ok(Self::binary(
            "application/pdf",
            &format!("statistik_{}_{}.pdf", id, year),
        ))
    }

    async fn version_info(&self, token: &str) -> Result<VersionInfo, BackendError> {
        let data = self.begin_admin("version_info", token)?;
        Ok(data.version.clone())
    }

    async fn update_system(&self, token: &str) -> Result<UpdateResult, BackendError> {
        let data = self.begin_admin("update_system", token)?;
        Ok(UpdateResult {
            success: true,
            message: "Update erfolgreich".to_owned(),
            current_version: Some(data.version.current_version.clone()),
            new_version: data.version.remote_commit.clone(),
            output: "=== Git Pull ===\nAlready up to date.".to_owned(),
        })
    }

    async fn restart(&self, token: &str) -> Result<MessageResponse, BackendError> {
        let _data = self.begin_admin("restart", token)?;
        Ok(message("Services werden neu gestartet"))
    }

    async fn reboot(&self, token: &str) -> Result<MessageResponse, BackendError> {
        let _data = self.begin_admin("reboot", token)?;
        Ok(message("System wird neu gestartet..."))
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let data = self.begin("health")?;
        Ok(HealthStatus {
            status: "healthy".to_owned(),
            version: Some(data.version.current_version.clone()),
        })
    }

    async fn refresh_kiosk(&self) -> Result<(), BackendError> {
        let _data = self.begin("refresh_kiosk")?;
        Ok(())
    }

    async fn event_stream(&self) -> Result<EventStream, BackendError> {
        let mut data = self.begin("event_stream")?;
        let chunks = std::mem::take(&mut data.event_chunks);
        Ok(futures::stream::iter(chunks.into_iter().map(|c| Ok(c.into_bytes()))).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_in_and_out_update_counts() {
        let mock = sample_data::backend_with_sample_data();
        let request = AttendanceRequest {
            session_id: sample_data::SESSION_UEBUNG,
            stammrollennummer: "1042".to_owned(),
        };
        let before = mock.sessions(&SessionsQuery::default()).await.unwrap();
        let count = |list: &Vec<SessionSummary>| {
            list.iter()
                .find(|s| s.id == sample_data::SESSION_UEBUNG)
                .unwrap()
                .active_attendees
        };
        let initial = count(&before);

        mock.check_in(&request).await.unwrap();
        let after_check_in = mock.sessions(&SessionsQuery::default()).await.unwrap();
        assert_eq!(count(&after_check_in), initial + 1);

        let second = mock.check_in(&request).await;
        assert!(matches!(second, Err(BackendError::Rejected { .. })));

        mock.check_out(&request).await.unwrap();
        let after_check_out = mock.sessions(&SessionsQuery::default()).await.unwrap();
        assert_eq!(count(&after_check_out), initial);
    }

    #[tokio::test]
    async fn test_end_emergency_requires_rank() {
        let mock = sample_data::backend_with_sample_data();
        let result = mock
            .end_session(
                sample_data::SESSION_EINSATZ,
                &EndSessionAuthorization::Personnel("1042".to_owned()),
            )
            .await;
        assert!(matches!(
            result,
            Err(BackendError::PermissionDenied { .. })
        ));

        mock.end_session(
            sample_data::SESSION_EINSATZ,
            &EndSessionAuthorization::Personnel("2001".to_owned()),
        )
        .await
        .unwrap();
        let detail = mock.session(sample_data::SESSION_EINSATZ).await.unwrap();
        assert!(!detail.is_active);
        assert_eq!(detail.active_attendees(), 0);
    }
}
