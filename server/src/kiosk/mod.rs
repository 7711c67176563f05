//! The kiosk check-in core.
//!
//! All kiosk state lives in the [KioskHub]: the per-browser [station::KioskStation]s, the presence
//! snapshots of the active sessions, and the news and announcement rotations. The hub is fed by
//! the periodic tasks of [pollers::PollerSet] and by the kiosk endpoints, and notifies the browsers
//! through the [events::Broadcaster].
use crate::auth_session::AdminSession;
use crate::backend::cache::EntityCache;
use crate::backend::{AttendanceBackend, BackendError, EndSessionAuthorization};
use crate::kiosk::events::{BackendEvent, Broadcaster, KioskEvent};
use crate::kiosk::qr::{MobileCheckin, INVALID_QR_CODE_MESSAGE};
use crate::kiosk::rotation::{Rotator, ROTATION_INTERVAL};
use crate::kiosk::snapshot::PresenceSnapshot;
use crate::kiosk::station::{DisplayMode, KioskRegistry, KioskStation, MessageKind};
use crate::kiosk::toggle::{submit_attendance, PersonnelNumber};
use ffw_checkin_api_types::content::{Announcement, News};
use ffw_checkin_api_types::sessions::{ActiveSession, EventType};
use ffw_checkin_api_types::settings::{StationSettings, SystemSettings};
use ffw_checkin_api_types::SessionId;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

pub mod events;
pub mod idle;
pub mod pollers;
pub mod qr;
pub mod rotation;
pub mod selection;
pub mod snapshot;
pub mod station;
pub mod toggle;

const NO_SESSION_SELECTED_MESSAGE: &str = "Keine Session ausgewählt";
const LOGIN_REQUIRED_FOR_CREATION_MESSAGE: &str = "Admin-Login erforderlich für Session-Erstellung";
const CREATION_DENIED_MESSAGE: &str = "Keine Berechtigung neue Session zu erstellen";

pub struct KioskHub {
    pub backend: Arc<dyn AttendanceBackend>,
    pub cache: EntityCache,
    pub registry: KioskRegistry,
    pub broadcaster: Broadcaster,
    state: Mutex<HubState>,
}

struct HubState {
    /// Active sessions of the last successful poll, None before the first one
    sessions: Option<Vec<ActiveSession>>,
    snapshots: HashMap<SessionId, PresenceSnapshot>,
    announcements: Rotator<Announcement>,
    news: Rotator<News>,
    backend_version: Option<String>,
}

/// Everything needed to render the kiosk panel of one station
pub struct KioskView {
    pub station: KioskStation,
    pub presence: PresenceSnapshot,
    pub announcement: Option<Announcement>,
    pub announcement_count: usize,
    pub news: Option<News>,
    pub station_settings: StationSettings,
    pub system_settings: SystemSettings,
}

impl KioskHub {
    pub fn new(backend: Arc<dyn AttendanceBackend>) -> Self {
        let now = Instant::now();
        Self {
            cache: EntityCache::new(backend.clone()),
            backend,
            registry: KioskRegistry::default(),
            broadcaster: Broadcaster::default(),
            state: Mutex::new(HubState {
                sessions: None,
                snapshots: HashMap::new(),
                announcements: Rotator::new(ROTATION_INTERVAL, now),
                news: Rotator::new(ROTATION_INTERVAL, now),
                backend_version: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn system_settings_or_default(&self) -> SystemSettings {
        self.cache.system_settings().await.unwrap_or_else(|e| {
            warn!("Could not fetch system settings, using defaults: {}", e);
            SystemSettings::default()
        })
    }

    /// Register the kiosk station `kiosk_id` (if not known yet) and load its session selection.
    pub async fn open_station(&self, kiosk_id: &str, mode: DisplayMode, now: Instant) {
        let settings = self.system_settings_or_default().await;
        self.registry.ensure(kiosk_id, mode, &settings, now);
        let known_sessions = self.lock().sessions.clone();
        let sessions = match known_sessions {
            Some(sessions) => sessions,
            None => {
                if let Err(e) = self.poll_presence().await {
                    warn!("Could not load active sessions: {}", e);
                }
                self.lock().sessions.clone().unwrap_or_default()
            }
        };
        self.registry
            .with_station(kiosk_id, |station| station.selection.sessions_loaded(sessions));
    }

    /// Fetch the active sessions with their present personnel, replace all presence snapshots and
    /// update the session selection of all stations.
    pub async fn poll_presence(&self) -> Result<(), BackendError> {
        let sessions = self.backend.active_sessions().await?;
        let presence_changed = {
            let mut state = self.lock();
            let mut changed = state.snapshots.len() != sessions.len();
            state
                .snapshots
                .retain(|id, _| sessions.iter().any(|s| s.id == *id));
            for session in sessions.iter() {
                changed |= state
                    .snapshots
                    .entry(session.id)
                    .or_default()
                    .replace(session.active_personnel.clone());
            }
            state.sessions = Some(sessions.clone());
            changed
        };
        let changed_stations = self
            .registry
            .update_all(|station| station.selection.sessions_loaded(sessions.clone()));
        if presence_changed {
            self.broadcaster.broadcast(KioskEvent::Presence);
        } else {
            for kiosk_id in changed_stations {
                self.broadcaster.send_to(&kiosk_id, KioskEvent::Presence);
            }
        }
        Ok(())
    }

    /// Re-fetch the presence of a single session, e.g. directly after a check-in
    pub async fn refresh_presence(&self, session_id: SessionId) -> Result<(), BackendError> {
        let personnel = self.backend.session_presence(session_id).await?;
        let changed = self
            .lock()
            .snapshots
            .entry(session_id)
            .or_default()
            .replace(personnel);
        if changed {
            self.broadcaster.broadcast(KioskEvent::Presence);
        }
        Ok(())
    }

    pub fn presence(&self, session_id: SessionId) -> PresenceSnapshot {
        self.lock()
            .snapshots
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn refresh_announcements(&self) -> Result<(), BackendError> {
        let announcements = self.cache.refresh_announcements().await?;
        let changed = {
            let mut state = self.lock();
            let changed = state.announcements.items() != announcements.as_slice();
            state.announcements.replace_items(announcements);
            changed
        };
        if changed {
            self.broadcaster.broadcast(KioskEvent::Announcements);
        }
        Ok(())
    }

    pub async fn refresh_news(&self) -> Result<(), BackendError> {
        let news = self.cache.refresh_news().await?;
        let changed = {
            let mut state = self.lock();
            let changed = state.news.items() != news.as_slice();
            state.news.replace_items(news);
            changed
        };
        if changed {
            self.broadcaster.broadcast(KioskEvent::News);
        }
        Ok(())
    }

    pub fn rotate_announcements(&self, now: Instant) {
        if self.lock().announcements.tick(now) {
            self.broadcaster.broadcast(KioskEvent::Announcements);
        }
    }

    pub fn rotate_news(&self, now: Instant) {
        if self.lock().news.tick(now) {
            self.broadcaster.broadcast(KioskEvent::News);
        }
    }

    /// Manual navigation in the announcement banner
    pub fn navigate_announcements(&self, forward: bool, now: Instant) {
        {
            let mut state = self.lock();
            if forward {
                state.announcements.next(now);
            } else {
                state.announcements.prev(now);
            }
        }
        self.broadcaster.broadcast(KioskEvent::Announcements);
    }

    /// Check the backend version. When it has changed (e.g. after a system update), all kiosks are
    /// told to reload.
    pub async fn check_version(&self) -> Result<(), BackendError> {
        let version = self.backend.health().await?.version;
        let changed = {
            let mut state = self.lock();
            let changed = state.backend_version.is_some() && state.backend_version != version;
            state.backend_version = version;
            changed
        };
        if changed {
            info!("Backend version has changed. Reloading kiosks.");
            self.broadcaster.broadcast(KioskEvent::Refresh);
        }
        Ok(())
    }

    /// Advance the idle timers of all stations and show the screensaver where it has timed out
    pub fn idle_tick(&self, now: Instant) {
        for kiosk_id in self
            .registry
            .update_all(|station| station.idle.poll(now).is_some())
        {
            debug!("Screensaver of kiosk {} activated", kiosk_id);
            self.broadcaster.send_to(&kiosk_id, KioskEvent::Screensaver);
        }
    }

    /// Drop disconnected browsers and tear down stations without remaining clients. Stations that
    /// never had a client (mobile check-ins) are torn down once they have not been used for a while.
    pub fn remove_stale_clients(&self, now: Instant) {
        for kiosk_id in self.broadcaster.remove_stale_clients() {
            if self.registry.remove(&kiosk_id) {
                debug!("Kiosk station {} torn down", kiosk_id);
            }
        }
        let connected = self.broadcaster.connected_kiosks();
        for kiosk_id in self.registry.remove_unconnected(&connected, now) {
            debug!("Unused kiosk station {} torn down", kiosk_id);
        }
    }

    pub async fn handle_backend_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::Refresh => self.reload_content().await,
            BackendEvent::Other(data) => debug!("Ignoring backend event {}", data),
        }
    }

    /// Drop all cached content, re-fetch it and make all kiosks reload
    pub async fn reload_content(&self) {
        self.cache.invalidate();
        let settings = self.system_settings_or_default().await;
        self.registry.update_all(|station| {
            station.apply_settings(&settings);
            false
        });
        if let Err(e) = self.refresh_announcements().await {
            warn!("Could not refresh announcements: {}", e);
        }
        if let Err(e) = self.refresh_news().await {
            warn!("Could not refresh news: {}", e);
        }
        if let Err(e) = self.poll_presence().await {
            warn!("Could not refresh presence: {}", e);
        }
        self.broadcaster.broadcast(KioskEvent::Refresh);
    }

    /// To be called after every successful admin change: invalidates the local cache and asks the
    /// backend to notify all kiosks.
    pub async fn notify_admin_change(&self) {
        self.cache.invalidate();
        if let Err(e) = self.backend.refresh_kiosk().await {
            warn!("Could not trigger kiosk refresh at backend: {}", e);
            self.reload_content().await;
        }
    }

    pub fn record_activity(&self, kiosk_id: &str, now: Instant) {
        let transition = self
            .registry
            .with_station(kiosk_id, |station| station.record_activity(now));
        if transition == Some(idle::IdleTransition::Dismissed) {
            self.broadcaster.send_to(kiosk_id, KioskEvent::Screensaver);
        }
    }

    fn show_message(&self, kiosk_id: &str, kind: MessageKind, text: &str, now: Instant) {
        self.registry
            .with_station(kiosk_id, |station| station.show_message(kind, text, now));
    }

    /// Handle a number entered on the keypad of a stationary kiosk
    pub async fn submit(&self, kiosk_id: &str, input: &str, now: Instant) {
        self.record_activity(kiosk_id, now);
        let session_id = self
            .registry
            .with_station(kiosk_id, |station| station.selection.selected().map(|s| s.id))
            .flatten();
        match session_id {
            Some(session_id) => self.submit_for_session(kiosk_id, session_id, input, now).await,
            None => self.show_message(kiosk_id, MessageKind::Error, NO_SESSION_SELECTED_MESSAGE, now),
        }
    }

    /// Handle a number entered on the mobile check-in page. The QR token is validated again before
    /// each submission.
    pub async fn submit_mobile(&self, kiosk_id: &str, token: &str, input: &str, now: Instant) {
        match MobileCheckin::resolve(self.backend.as_ref(), Some(token)).await {
            MobileCheckin::Ready { session, .. } => {
                self.submit_for_session(kiosk_id, session.id, input, now)
                    .await
            }
            MobileCheckin::Invalid => {
                self.show_message(kiosk_id, MessageKind::Error, INVALID_QR_CODE_MESSAGE, now)
            }
        }
    }

    async fn submit_for_session(
        &self,
        kiosk_id: &str,
        session_id: SessionId,
        input: &str,
        now: Instant,
    ) {
        let number = match PersonnelNumber::parse(input) {
            Ok(number) => number,
            Err(e) => {
                self.show_message(kiosk_id, MessageKind::Error, &e.to_string(), now);
                return;
            }
        };
        let snapshot = self.presence(session_id);
        let outcome =
            submit_attendance(self.backend.as_ref(), session_id, &number, &snapshot).await;
        let kind = if outcome.is_success() {
            MessageKind::Success
        } else {
            MessageKind::Error
        };
        self.show_message(kiosk_id, kind, outcome.message(), now);
        if let Err(e) = self.refresh_presence(session_id).await {
            warn!("Could not refresh presence of session {}: {}", session_id, e);
        }
    }

    pub fn choose_session(&self, kiosk_id: &str, session_id: SessionId, now: Instant) {
        let result = self.registry.with_station(kiosk_id, |station| {
            station.record_activity(now);
            station.selection.choose(session_id)
        });
        if let Some(Err(e)) = result {
            self.show_message(kiosk_id, MessageKind::Error, &e.to_string(), now);
        }
    }

    pub fn request_switch(&self, kiosk_id: &str, now: Instant) {
        self.registry.with_station(kiosk_id, |station| {
            station.record_activity(now);
            station.selection.request_switch()
        });
    }

    pub fn cancel_creation(&self, kiosk_id: &str, now: Instant) {
        self.registry.with_station(kiosk_id, |station| {
            station.record_activity(now);
            station.selection.cancel_creation()
        });
    }

    /// Create a new session from the kiosk. This requires a logged-in admin in the same browser.
    pub async fn create_session(
        &self,
        kiosk_id: &str,
        event_type: EventType,
        admin: Option<&AdminSession>,
        now: Instant,
    ) {
        self.record_activity(kiosk_id, now);
        let Some(admin) = admin else {
            self.show_message(
                kiosk_id,
                MessageKind::Error,
                LOGIN_REQUIRED_FOR_CREATION_MESSAGE,
                now,
            );
            return;
        };
        match self
            .backend
            .create_session(event_type, Some(&admin.token))
            .await
        {
            Ok(created) => {
                info!("Session {} ({}) created at kiosk", created.id, event_type);
                self.registry.with_station(kiosk_id, |station| {
                    station.selection.session_created(ActiveSession::from(created))
                });
                if let Err(e) = self.poll_presence().await {
                    warn!("Could not refresh active sessions: {}", e);
                }
            }
            Err(BackendError::Unauthenticated) | Err(BackendError::PermissionDenied { .. }) => {
                self.show_message(kiosk_id, MessageKind::Error, CREATION_DENIED_MESSAGE, now)
            }
            Err(e) => {
                warn!("Could not create session: {}", e);
                self.show_message(
                    kiosk_id,
                    MessageKind::Error,
                    e.user_message("Fehler beim Erstellen der Session"),
                    now,
                )
            }
        }
    }

    /// End the selected session, authorized by a personnel number entered at the kiosk (or by the
    /// logged-in admin, if no number is entered). The rank check is done by the backend.
    pub async fn end_session(
        &self,
        kiosk_id: &str,
        input: &str,
        admin: Option<&AdminSession>,
        now: Instant,
    ) {
        self.record_activity(kiosk_id, now);
        let session_id = self
            .registry
            .with_station(kiosk_id, |station| station.selection.selected().map(|s| s.id))
            .flatten();
        let Some(session_id) = session_id else {
            self.show_message(kiosk_id, MessageKind::Error, NO_SESSION_SELECTED_MESSAGE, now);
            return;
        };
        let authorization = match (input.trim().is_empty(), admin) {
            (true, Some(admin)) => EndSessionAuthorization::Admin(admin.token.clone()),
            _ => match PersonnelNumber::parse(input) {
                Ok(number) => EndSessionAuthorization::Personnel(number.as_str().to_owned()),
                Err(e) => {
                    self.show_message(kiosk_id, MessageKind::Error, &e.to_string(), now);
                    return;
                }
            },
        };
        match self.backend.end_session(session_id, &authorization).await {
            Ok(response) => {
                info!("Session {} ended at kiosk", session_id);
                self.show_message(kiosk_id, MessageKind::Success, &response.message, now);
                if let Err(e) = self.poll_presence().await {
                    warn!("Could not refresh active sessions: {}", e);
                }
            }
            Err(e) => {
                if !e.is_business_error() {
                    warn!("Could not end session {}: {}", session_id, e);
                }
                self.show_message(
                    kiosk_id,
                    MessageKind::Error,
                    e.user_message("Fehler beim Beenden der Session"),
                    now,
                );
            }
        }
    }

    /// Collect the data for rendering the kiosk panel. Returns None for unknown stations.
    pub async fn view(&self, kiosk_id: &str) -> Option<KioskView> {
        let station = self.registry.snapshot(kiosk_id)?;
        let station_settings = self.cache.station_settings().await.unwrap_or_else(|e| {
            warn!("Could not fetch station settings: {}", e);
            StationSettings::default()
        });
        let system_settings = self.system_settings_or_default().await;
        let state = self.lock();
        let presence = station
            .selection
            .selected()
            .and_then(|s| state.snapshots.get(&s.id))
            .cloned()
            .unwrap_or_default();
        Some(KioskView {
            presence,
            announcement: state.announcements.current().cloned(),
            announcement_count: state.announcements.len(),
            news: state.news.current().cloned(),
            station,
            station_settings,
            system_settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::sample_data::{self, SESSION_EINSATZ, SESSION_UEBUNG};
    use crate::backend::mock::BackendMock;
    use crate::kiosk::selection::SelectionState;

    async fn hub_with_station() -> (Arc<BackendMock>, KioskHub) {
        let backend = Arc::new(sample_data::backend_with_sample_data());
        let hub = KioskHub::new(backend.clone());
        hub.open_station("k1", DisplayMode::Station, Instant::now())
            .await;
        (backend, hub)
    }

    fn message(hub: &KioskHub) -> Option<String> {
        hub.registry
            .snapshot("k1")
            .and_then(|s| s.message(Instant::now()).map(|m| m.text.clone()))
    }

    #[tokio::test]
    async fn test_check_in_updates_presence() {
        let (_backend, hub) = hub_with_station().await;
        assert_eq!(
            hub.registry.snapshot("k1").unwrap().selection.state(),
            &SelectionState::MultipleActive
        );
        hub.choose_session("k1", SESSION_UEBUNG, Instant::now());
        assert_eq!(hub.presence(SESSION_UEBUNG).len(), 1);

        hub.submit("k1", "1042", Instant::now()).await;
        assert_eq!(message(&hub).as_deref(), Some("Willkommen Anna Schmidt!"));
        assert_eq!(hub.presence(SESSION_UEBUNG).len(), 2);

        hub.submit("k1", "1042", Instant::now()).await;
        assert_eq!(message(&hub).as_deref(), Some("Erfolgreich ausgecheckt!"));
        assert_eq!(hub.presence(SESSION_UEBUNG).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_number_is_not_submitted() {
        let (backend, hub) = hub_with_station().await;
        hub.choose_session("k1", SESSION_UEBUNG, Instant::now());
        hub.submit("k1", "12", Instant::now()).await;
        assert_eq!(
            message(&hub).as_deref(),
            Some("Bitte eine Stammrollennummer mit 3 bis 10 Ziffern eingeben")
        );
        assert_eq!(backend.call_count("check_in"), 0);
    }

    #[tokio::test]
    async fn test_session_creation_requires_admin() {
        let (backend, hub) = hub_with_station().await;
        hub.create_session("k1", EventType::Einsatz, None, Instant::now())
            .await;
        assert_eq!(
            message(&hub).as_deref(),
            Some("Admin-Login erforderlich für Session-Erstellung")
        );
        assert_eq!(backend.call_count("create_session"), 0);

        let expired = AdminSession::new("outdated".into(), "admin".into(), "admin".into());
        hub.create_session("k1", EventType::Einsatz, Some(&expired), Instant::now())
            .await;
        assert_eq!(
            message(&hub).as_deref(),
            Some("Keine Berechtigung neue Session zu erstellen")
        );

        let admin = AdminSession::new(
            crate::backend::mock::ADMIN_TOKEN.into(),
            "admin".into(),
            "admin".into(),
        );
        hub.create_session("k1", EventType::ArbeitsdienstB, Some(&admin), Instant::now())
            .await;
        let station = hub.registry.snapshot("k1").unwrap();
        assert_eq!(
            station.selection.selected().map(|s| s.event_type),
            Some(EventType::ArbeitsdienstB)
        );
    }

    #[tokio::test]
    async fn test_end_emergency_shows_backend_decision() {
        let (_backend, hub) = hub_with_station().await;
        hub.choose_session("k1", SESSION_EINSATZ, Instant::now());

        hub.end_session("k1", "3077", None, Instant::now()).await;
        assert_eq!(
            message(&hub).as_deref(),
            Some("Zum Beenden eines Einsatzes ist mindestens der Dienstgrad UBM erforderlich")
        );

        hub.end_session("k1", "4100", None, Instant::now()).await;
        assert_eq!(message(&hub).as_deref(), Some("Session erfolgreich beendet"));
        // Only the "Übungsdienst" is left, so it is selected automatically
        let station = hub.registry.snapshot("k1").unwrap();
        assert_eq!(station.selection.selected().map(|s| s.id), Some(SESSION_UEBUNG));
    }

    #[tokio::test]
    async fn test_mobile_submit_revalidates_token() {
        let (backend, hub) = hub_with_station().await;
        hub.registry.ensure(
            "phone",
            DisplayMode::Mobile {
                token: sample_data::QR_TOKEN.to_owned(),
            },
            &SystemSettings::default(),
            Instant::now(),
        );
        hub.submit_mobile("phone", sample_data::QR_TOKEN, "2001", Instant::now())
            .await;
        assert_eq!(backend.call_count("validate_qr_token"), 1);
        assert_eq!(hub.presence(SESSION_UEBUNG).len(), 2);

        backend.data.lock().unwrap().qr_tokens.clear();
        hub.submit_mobile("phone", sample_data::QR_TOKEN, "2001", Instant::now())
            .await;
        let message = hub
            .registry
            .snapshot("phone")
            .and_then(|s| s.message(Instant::now()).map(|m| m.text.clone()));
        assert_eq!(message.as_deref(), Some("Ungültiger QR-Code"));
        assert_eq!(backend.call_count("check_out"), 0);
    }

    #[tokio::test]
    async fn test_stale_station_is_torn_down() {
        let (_backend, hub) = hub_with_station().await;
        let client = hub.broadcaster.new_client("k1");
        hub.remove_stale_clients(Instant::now());
        assert_eq!(hub.registry.len(), 1);
        drop(client);
        hub.remove_stale_clients(Instant::now());
        assert!(hub.registry.is_empty());
    }

    #[tokio::test]
    async fn test_mobile_stations_do_not_pile_up() {
        let (_backend, hub) = hub_with_station().await;
        let _client = hub.broadcaster.new_client("k1");
        let start = Instant::now();
        for i in 0..50 {
            hub.open_station(
                &format!("phone-{}", i),
                DisplayMode::Mobile {
                    token: sample_data::QR_TOKEN.to_owned(),
                },
                start,
            )
            .await;
        }
        assert_eq!(hub.registry.len(), 51);

        for minute in 1..=5 {
            hub.remove_stale_clients(start + std::time::Duration::from_secs(minute * 60));
        }
        assert_eq!(hub.registry.len(), 51);

        hub.remove_stale_clients(
            start + station::UNCONNECTED_STATION_LIFETIME + std::time::Duration::from_secs(1),
        );
        assert_eq!(hub.registry.len(), 1);
        assert!(hub.registry.snapshot("k1").is_some());
    }
}
