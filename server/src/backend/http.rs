use crate::backend::{
    AttendanceBackend, BackendError, BinaryFile, EndSessionAuthorization, EventStream,
};
use async_trait::async_trait;
use ffw_checkin_api_types::attendance::{
    AttendanceRequest, CheckInResponse, CheckOutResponse, PresentPersonnel, TokenValidation,
    ValidateTokenRequest,
};
use ffw_checkin_api_types::audit::{AuditFilter, AuditPage};
use ffw_checkin_api_types::auth::{AdminUser, LoginRequest, LoginResponse};
use ffw_checkin_api_types::backup::{BackupCreated, BackupFile, BackupList, RestoreRequest};
use ffw_checkin_api_types::content::{Announcement, AnnouncementData, News, NewsData};
use ffw_checkin_api_types::personnel::{Personnel, PersonnelData};
use ffw_checkin_api_types::sessions::{
    ActiveSession, CreatedSession, EndSessionRequest, EventType, NewSession, SessionDetail,
    SessionSummary, SessionsQuery,
};
use ffw_checkin_api_types::settings::{
    BackupSettings, PathValidation, StationSettings, SystemSettings, ValidatePathRequest,
};
use ffw_checkin_api_types::statistics::{PersonnelYearly, UnitYearly};
use ffw_checkin_api_types::system::{HealthStatus, UpdateResult, VersionInfo};
use ffw_checkin_api_types::{
    AnnouncementId, ErrorDetail, MessageResponse, NewsId, PersonnelId, SessionId,
};
use futures::StreamExt;
use lazy_static::lazy_static;
use log::debug;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// [AttendanceBackend] implementation talking to the real backend via HTTP/JSON
///
/// Requests are never retried. A request that does not complete within the configured timeout
/// fails with [BackendError::ConnectionError].
pub struct HttpBackend {
    client: reqwest::Client,
    /// Client without total request timeout for the long-lived event stream
    stream_client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            stream_client: reqwest::Client::builder()
                .connect_timeout(timeout)
                .build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL of an API endpoint from its path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!("Backend request {} {}", method, url);
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get(&self, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        self.request(Method::GET, segments, token)
    }

    fn post(&self, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        self.request(Method::POST, segments, token)
    }

    fn put(&self, segments: &[&str], token: &str) -> RequestBuilder {
        self.request(Method::PUT, segments, Some(token))
    }

    fn delete(&self, segments: &[&str], token: &str) -> RequestBuilder {
        self.request(Method::DELETE, segments, Some(token))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::ConnectionError(e.to_string()))?;
        check_status(response).await
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        Self::send(builder).await?.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                BackendError::InvalidResponse(e.to_string())
            } else {
                BackendError::ConnectionError(e.to_string())
            }
        })
    }

    async fn empty(builder: RequestBuilder) -> Result<(), BackendError> {
        Self::send(builder).await?;
        Ok(())
    }

    async fn binary(builder: RequestBuilder) -> Result<BinaryFile, BackendError> {
        let response = Self::send(builder).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        let data = response
            .bytes()
            .await
            .map_err(|e| BackendError::ConnectionError(e.to_string()))?;
        Ok(BinaryFile {
            content_type,
            filename,
            data: data.to_vec(),
        })
    }
}

/// Translate a non-success HTTP response into the matching [BackendError]
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .json::<ErrorDetail>()
        .await
        .ok()
        .and_then(|d| d.text().map(str::to_owned));
    Err(error_from_status(status.as_u16(), detail))
}

fn error_from_status(status: u16, detail: Option<String>) -> BackendError {
    match status {
        401 => BackendError::Unauthenticated,
        403 => BackendError::PermissionDenied { detail },
        404 => BackendError::NotExisting { detail },
        400..=499 => match detail {
            Some(detail) => BackendError::Rejected { status, detail },
            None => BackendError::ServerError {
                status,
                detail: None,
            },
        },
        _ => BackendError::ServerError { status, detail },
    }
}

fn filename_from_content_disposition(header: &str) -> Option<String> {
    lazy_static! {
        static ref FILENAME_REGEX: regex::Regex =
            regex::Regex::new(r#"filename="?([^";]+)"?"#).unwrap();
    }
    FILENAME_REGEX
        .captures(header)
        .map(|captures| captures[1].trim().to_owned())
}

#[async_trait]
impl AttendanceBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, BackendError> {
        Self::json(self.post(&["auth", "login"], None).json(&LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        }))
        .await
    }

    async fn current_user(&self, token: &str) -> Result<AdminUser, BackendError> {
        Self::json(self.get(&["auth", "me"], Some(token))).await
    }

    async fn active_sessions(&self) -> Result<Vec<ActiveSession>, BackendError> {
        Self::json(self.get(&["sessions", "active", "current"], None)).await
    }

    async fn session_presence(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PresentPersonnel>, BackendError> {
        Self::json(self.get(
            &["attendance", "session", &session_id.to_string(), "active"],
            None,
        ))
        .await
    }

    async fn check_in(
        &self,
        request: &AttendanceRequest,
    ) -> Result<CheckInResponse, BackendError> {
        Self::json(self.post(&["attendance", "checkin"], None).json(request)).await
    }

    async fn check_out(
        &self,
        request: &AttendanceRequest,
    ) -> Result<CheckOutResponse, BackendError> {
        Self::json(self.post(&["attendance", "checkout"], None).json(request)).await
    }

    async fn validate_qr_token(&self, token: &str) -> Result<TokenValidation, BackendError> {
        Self::json(
            self.post(&["checkin", "validate-token"], None)
                .json(&ValidateTokenRequest {
                    token: token.to_owned(),
                }),
        )
        .await
    }

    async fn create_session(
        &self,
        event_type: EventType,
        token: Option<&str>,
    ) -> Result<CreatedSession, BackendError> {
        Self::json(self.post(&["sessions"], token).json(&NewSession { event_type })).await
    }

    async fn end_session(
        &self,
        session_id: SessionId,
        authorization: &EndSessionAuthorization,
    ) -> Result<MessageResponse, BackendError> {
        let session_id = session_id.to_string();
        let segments = ["sessions", session_id.as_str(), "end"];
        let builder = match authorization {
            EndSessionAuthorization::Admin(token) => self
                .post(&segments, Some(token))
                .json(&EndSessionRequest::default()),
            EndSessionAuthorization::Personnel(number) => {
                self.post(&segments, None).json(&EndSessionRequest {
                    stammrollennummer: Some(number.clone()),
                })
            }
        };
        Self::json(builder).await
    }

    async fn active_announcements(&self) -> Result<Vec<Announcement>, BackendError> {
        Self::json(self.get(&["announcements", "active"], None)).await
    }

    async fn announcements(&self, token: &str) -> Result<Vec<Announcement>, BackendError> {
        Self::json(self.get(&["announcements"], Some(token))).await
    }

    async fn announcement(
        &self,
        token: &str,
        id: AnnouncementId,
    ) -> Result<Announcement, BackendError> {
        Self::json(self.get(&["announcements", &id.to_string()], Some(token))).await
    }

    async fn create_announcement(
        &self,
        token: &str,
        data: &AnnouncementData,
    ) -> Result<(), BackendError> {
        Self::empty(self.post(&["announcements"], Some(token)).json(data)).await
    }

    async fn update_announcement(
        &self,
        token: &str,
        id: AnnouncementId,
        data: &AnnouncementData,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["announcements", &id.to_string()], token).json(data)).await
    }

    async fn delete_announcement(
        &self,
        token: &str,
        id: AnnouncementId,
    ) -> Result<(), BackendError> {
        Self::empty(self.delete(&["announcements", &id.to_string()], token)).await
    }

    async fn news(&self, active_only: bool) -> Result<Vec<News>, BackendError> {
        Self::json(
            self.get(&["news"], None)
                .query(&[("active_only", active_only)]),
        )
        .await
    }

    async fn news_item(&self, id: NewsId) -> Result<News, BackendError> {
        Self::json(self.get(&["news", &id.to_string()], None)).await
    }

    async fn create_news(&self, token: &str, data: &NewsData) -> Result<(), BackendError> {
        Self::empty(self.post(&["news"], Some(token)).json(data)).await
    }

    async fn update_news(
        &self,
        token: &str,
        id: NewsId,
        data: &NewsData,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["news", &id.to_string()], token).json(data)).await
    }

    async fn delete_news(&self, token: &str, id: NewsId) -> Result<(), BackendError> {
        Self::empty(self.delete(&["news", &id.to_string()], token)).await
    }

    async fn sessions(&self, query: &SessionsQuery) -> Result<Vec<SessionSummary>, BackendError> {
        Self::json(self.get(&["sessions"], None).query(query)).await
    }

    async fn session(&self, id: SessionId) -> Result<SessionDetail, BackendError> {
        Self::json(self.get(&["sessions", &id.to_string()], None)).await
    }

    async fn delete_session(&self, token: &str, id: SessionId) -> Result<(), BackendError> {
        Self::empty(self.delete(&["sessions", &id.to_string()], token)).await
    }

    async fn session_qr_png(&self, id: SessionId) -> Result<BinaryFile, BackendError> {
        Self::binary(self.get(&["sessions", &id.to_string(), "qr"], None)).await
    }

    async fn session_pdf(&self, token: &str, id: SessionId) -> Result<BinaryFile, BackendError> {
        Self::binary(self.get(&["sessions", &id.to_string(), "pdf"], Some(token))).await
    }

    async fn personnel(
        &self,
        token: &str,
        active_only: bool,
    ) -> Result<Vec<Personnel>, BackendError> {
        Self::json(
            self.get(&["personnel"], Some(token))
                .query(&[("active_only", active_only)]),
        )
        .await
    }

    async fn personnel_by_id(
        &self,
        token: &str,
        id: PersonnelId,
    ) -> Result<Personnel, BackendError> {
        Self::json(self.get(&["personnel", &id.to_string()], Some(token))).await
    }

    async fn personnel_by_number(
        &self,
        token: &str,
        stammrollennummer: &str,
    ) -> Result<Personnel, BackendError> {
        Self::json(self.get(&["personnel", "by-nummer", stammrollennummer], Some(token))).await
    }

    async fn create_personnel(
        &self,
        token: &str,
        data: &PersonnelData,
    ) -> Result<(), BackendError> {
        Self::empty(self.post(&["personnel"], Some(token)).json(data)).await
    }

    async fn update_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        data: &PersonnelData,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["personnel", &id.to_string()], token).json(data)).await
    }

    async fn delete_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        permanent: bool,
    ) -> Result<(), BackendError> {
        Self::empty(
            self.delete(&["personnel", &id.to_string()], token)
                .query(&[("permanent", permanent)]),
        )
        .await
    }

    async fn station_settings(&self) -> Result<StationSettings, BackendError> {
        Self::json(self.get(&["settings", "firestation"], None)).await
    }

    async fn update_station_settings(
        &self,
        token: &str,
        settings: &StationSettings,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["settings", "firestation"], token).json(settings)).await
    }

    async fn station_logo(&self) -> Result<BinaryFile, BackendError> {
        Self::binary(self.get(&["settings", "firestation", "logo"], None)).await
    }

    async fn system_settings(&self) -> Result<SystemSettings, BackendError> {
        Self::json(self.get(&["settings", "system"], None)).await
    }

    async fn update_system_settings(
        &self,
        token: &str,
        settings: &SystemSettings,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["settings", "system"], token).json(settings)).await
    }

    async fn backup_settings(&self, token: &str) -> Result<BackupSettings, BackendError> {
        Self::json(self.get(&["settings", "backup"], Some(token))).await
    }

    async fn update_backup_settings(
        &self,
        token: &str,
        settings: &BackupSettings,
    ) -> Result<(), BackendError> {
        Self::empty(self.put(&["settings", "backup"], token).json(settings)).await
    }

    async fn validate_backup_path(
        &self,
        token: &str,
        path: &str,
    ) -> Result<PathValidation, BackendError> {
        Self::json(
            self.post(&["settings", "backup", "validate-path"], Some(token))
                .json(&ValidatePathRequest {
                    path: path.to_owned(),
                }),
        )
        .await
    }

    async fn create_backup(&self, token: &str) -> Result<BackupCreated, BackendError> {
        Self::json(self.post(&["backup", "create"], Some(token))).await
    }

    async fn backups(&self, token: &str) -> Result<Vec<BackupFile>, BackendError> {
        let list: BackupList = Self::json(self.get(&["backup", "list"], Some(token))).await?;
        Ok(list.backups)
    }

    async fn download_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<BinaryFile, BackendError> {
        Self::binary(self.get(&["backup", "download", filename], Some(token))).await
    }

    async fn restore_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<MessageResponse, BackendError> {
        Self::json(
            self.post(&["backup", "restore"], Some(token))
                .json(&RestoreRequest {
                    filename: filename.to_owned(),
                }),
        )
        .await
    }

    async fn delete_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<MessageResponse, BackendError> {
        Self::json(self.delete(&["backup", filename], token)).await
    }

    async fn audit_log(
        &self,
        token: &str,
        filter: &AuditFilter,
    ) -> Result<AuditPage, BackendError> {
        Self::json(self.get(&["audit"], Some(token)).query(filter)).await
    }

    async fn audit_actions(&self, token: &str) -> Result<Vec<String>, BackendError> {
        Self::json(self.get(&["audit", "actions"], Some(token))).await
    }

    async fn audit_entity_types(&self, token: &str) -> Result<Vec<String>, BackendError> {
        Self::json(self.get(&["audit", "entity-types"], Some(token))).await
    }

    async fn unit_yearly(&self, token: &str, year: i32) -> Result<UnitYearly, BackendError> {
        Self::json(
            self.get(&["statistics", "unit", "yearly"], Some(token))
                .query(&[("year", year)]),
        )
        .await
    }

    async fn unit_yearly_pdf(&self, token: &str, year: i32) -> Result<BinaryFile, BackendError> {
        Self::binary(
            self.get(&["statistics", "unit", "yearly", "pdf"], Some(token))
                .query(&[("year", year)]),
        )
        .await
    }

    async fn personnel_yearly(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<PersonnelYearly, BackendError> {
        Self::json(
            self.get(
                &["statistics", "personnel", &id.to_string(), "yearly"],
                Some(token),
            )
            .query(&[("year", year)]),
        )
        .await
    }

    async fn personnel_yearly_pdf(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<BinaryFile, BackendError> {
        Self::binary(
            self.get(
                &["statistics", "personnel", &id.to_string(), "yearly", "pdf"],
                Some(token),
            )
            .query(&[("year", year)]),
        )
        .await
    }

    async fn version_info(&self, token: &str) -> Result<VersionInfo, BackendError> {
        Self::json(self.get(&["system", "version"], Some(token))).await
    }

    async fn update_system(&self, token: &str) -> Result<UpdateResult, BackendError> {
        Self::json(self.post(&["system", "update"], Some(token))).await
    }

    async fn restart(&self, token: &str) -> Result<MessageResponse, BackendError> {
        Self::json(self.post(&["system", "restart"], Some(token))).await
    }

    async fn reboot(&self, token: &str) -> Result<MessageResponse, BackendError> {
        Self::json(self.post(&["system", "reboot"], Some(token))).await
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        Self::json(self.get(&["system", "health"], None)).await
    }

    async fn refresh_kiosk(&self) -> Result<(), BackendError> {
        Self::empty(self.post(&["events", "refresh-kiosk"], None)).await
    }

    async fn event_stream(&self) -> Result<EventStream, BackendError> {
        let response = Self::send(self.stream_client.get(self.endpoint(&["events", "stream"])))
            .await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| BackendError::ConnectionError(e.to_string()))
            })
            .boxed())
    }
}
