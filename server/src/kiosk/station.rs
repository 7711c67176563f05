use crate::kiosk::idle::{IdleTimer, IdleTransition};
use crate::kiosk::selection::SessionSelection;
use ffw_checkin_api_types::settings::SystemSettings;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Display time of a transient kiosk message
pub const MESSAGE_DURATION: Duration = Duration::from_secs(3);

/// Stations without a connected event stream (phones, browsers without JavaScript) are dropped
/// when they have not been used for this long
pub const UNCONNECTED_STATION_LIFETIME: Duration = Duration::from_secs(10 * 60);

/// Identifier of a kiosk client, stored in a cookie of the browser
pub type KioskId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    /// The stationary kiosk with attendance list, session controls and screensaver
    Station,
    /// The reduced view on a phone, opened via a session's QR code
    Mobile { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransientMessage {
    pub kind: MessageKind,
    pub text: String,
    expires_at: Instant,
}

impl TransientMessage {
    /// Remaining display time in milliseconds. The browser removes the message after this time.
    pub fn millis_left(&self, now: Instant) -> u128 {
        self.expires_at.saturating_duration_since(now).as_millis()
    }
}

/// State of one kiosk client
#[derive(Debug, Clone)]
pub struct KioskStation {
    pub selection: SessionSelection,
    pub idle: IdleTimer,
    pub mode: DisplayMode,
    message: Option<TransientMessage>,
    last_seen: Instant,
}

impl KioskStation {
    pub fn new(mode: DisplayMode, settings: &SystemSettings, now: Instant) -> Self {
        let idle = match mode {
            DisplayMode::Station => {
                let mut idle = IdleTimer::disabled(now);
                idle.configure(settings);
                idle
            }
            DisplayMode::Mobile { .. } => IdleTimer::disabled(now),
        };
        Self {
            selection: SessionSelection::default(),
            idle,
            mode,
            message: None,
            last_seen: now,
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self.mode, DisplayMode::Mobile { .. })
    }

    pub fn apply_settings(&mut self, settings: &SystemSettings) {
        if !self.is_mobile() {
            self.idle.configure(settings);
        }
    }

    pub fn show_message(&mut self, kind: MessageKind, text: impl Into<String>, now: Instant) {
        self.last_seen = now;
        self.message = Some(TransientMessage {
            kind,
            text: text.into(),
            expires_at: now + MESSAGE_DURATION,
        });
    }

    /// The message to display, if it has not expired yet
    pub fn message(&self, now: Instant) -> Option<&TransientMessage> {
        self.message.as_ref().filter(|m| m.expires_at > now)
    }

    pub fn record_activity(&mut self, now: Instant) -> IdleTransition {
        self.last_seen = now;
        self.idle.record_activity(now)
    }
}

/// All known kiosk stations, by [KioskId]
#[derive(Default)]
pub struct KioskRegistry {
    stations: Mutex<HashMap<KioskId, KioskStation>>,
}

impl KioskRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<KioskId, KioskStation>> {
        self.stations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a station for `id`, if there is none yet. An existing station switches to the
    /// given display mode.
    pub fn ensure(&self, id: &str, mode: DisplayMode, settings: &SystemSettings, now: Instant) {
        let mut stations = self.lock();
        match stations.get_mut(id) {
            Some(station) if station.mode == mode => station.last_seen = now,
            _ => {
                stations.insert(id.to_owned(), KioskStation::new(mode, settings, now));
            }
        }
    }

    /// Run `f` on the station `id`. Returns None, if the station does not exist (anymore). In that
    /// case, nothing is written.
    pub fn with_station<R>(&self, id: &str, f: impl FnOnce(&mut KioskStation) -> R) -> Option<R> {
        self.lock().get_mut(id).map(f)
    }

    /// Run `f` on every station and collect the ids of those for which it returned true
    pub fn update_all(&self, mut f: impl FnMut(&mut KioskStation) -> bool) -> Vec<KioskId> {
        self.lock()
            .iter_mut()
            .filter_map(|(id, station)| f(station).then(|| id.clone()))
            .collect()
    }

    pub fn snapshot(&self, id: &str) -> Option<KioskStation> {
        self.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drop all stations which are not in `connected` and have not been used within
    /// [UNCONNECTED_STATION_LIFETIME]. Returns their ids.
    pub fn remove_unconnected(&self, connected: &HashSet<KioskId>, now: Instant) -> Vec<KioskId> {
        let mut removed = Vec::new();
        self.lock().retain(|id, station| {
            let keep = connected.contains(id)
                || now.saturating_duration_since(station.last_seen) < UNCONNECTED_STATION_LIFETIME;
            if !keep {
                removed.push(id.clone());
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_expires() {
        let now = Instant::now();
        let mut station = KioskStation::new(DisplayMode::Station, &SystemSettings::default(), now);
        station.show_message(MessageKind::Success, "Willkommen Anna Schmidt!", now);
        assert_eq!(
            station.message(now + Duration::from_secs(2)).map(|m| m.text.as_str()),
            Some("Willkommen Anna Schmidt!")
        );
        assert!(station.message(now + MESSAGE_DURATION).is_none());
    }

    #[test]
    fn test_message_time_left() {
        let now = Instant::now();
        let mut station = KioskStation::new(DisplayMode::Station, &SystemSettings::default(), now);
        station.show_message(MessageKind::Error, "Fehler beim Check-in/out", now);
        let message = station.message(now).unwrap().clone();
        assert_eq!(message.millis_left(now), 3000);
        assert_eq!(message.millis_left(now + Duration::from_millis(1200)), 1800);
        assert_eq!(message.millis_left(now + Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_mobile_station_has_no_screensaver() {
        let now = Instant::now();
        let mut station = KioskStation::new(
            DisplayMode::Mobile {
                token: "abc".to_owned(),
            },
            &SystemSettings::default(),
            now,
        );
        station.apply_settings(&SystemSettings::default());
        assert!(!station.idle.is_enabled());
        assert_eq!(station.idle.poll(now + Duration::from_secs(3600)), None);
    }

    #[test]
    fn test_writes_to_removed_station_are_discarded() {
        let registry = KioskRegistry::default();
        let now = Instant::now();
        registry.ensure("k1", DisplayMode::Station, &SystemSettings::default(), now);
        assert!(registry.remove("k1"));
        let result = registry.with_station("k1", |station| {
            station.show_message(MessageKind::Error, "zu spät", now);
        });
        assert!(result.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ensure_keeps_existing_station() {
        let registry = KioskRegistry::default();
        let now = Instant::now();
        registry.ensure("k1", DisplayMode::Station, &SystemSettings::default(), now);
        registry.with_station("k1", |station| {
            station.show_message(MessageKind::Success, "Hallo", now)
        });
        registry.ensure("k1", DisplayMode::Station, &SystemSettings::default(), now);
        assert!(registry
            .snapshot("k1")
            .and_then(|s| s.message(now).map(|m| m.text.clone()))
            .is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unused_unconnected_stations_are_removed() {
        let registry = KioskRegistry::default();
        let start = Instant::now();
        for i in 0..50 {
            registry.ensure(
                &format!("phone-{}", i),
                DisplayMode::Mobile {
                    token: "f3b1c7e2d9a04c8e".to_owned(),
                },
                &SystemSettings::default(),
                start,
            );
        }
        registry.ensure("k1", DisplayMode::Station, &SystemSettings::default(), start);
        registry.ensure("k2", DisplayMode::Station, &SystemSettings::default(), start);
        let connected = HashSet::from(["k1".to_owned()]);

        let removed = registry.remove_unconnected(&connected, start + Duration::from_secs(60));
        assert!(removed.is_empty());
        assert_eq!(registry.len(), 52);

        // A phone that submitted a number recently is kept
        let later = start + UNCONNECTED_STATION_LIFETIME;
        registry.with_station("phone-7", |station| {
            station.show_message(MessageKind::Success, "Erfolgreich ausgecheckt!", later)
        });
        let removed = registry.remove_unconnected(&connected, later + Duration::from_secs(1));
        assert_eq!(removed.len(), 50);
        assert!(!removed.contains(&"k1".to_owned()));
        assert!(registry.snapshot("k1").is_some());
        assert!(registry.snapshot("phone-7").is_some());
        assert!(registry.snapshot("k2").is_none());
    }
}
