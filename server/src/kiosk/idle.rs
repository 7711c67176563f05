use ffw_checkin_api_types::settings::{SystemSettings, DEFAULT_SCREENSAVER_TIMEOUT_SECONDS};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTransition {
    /// Activity while the kiosk was in use: the countdown restarts
    Reset,
    /// Activity while the screensaver was shown: the screensaver is dismissed and the countdown
    /// restarts from zero
    Dismissed,
    /// The timeout has elapsed without activity: the screensaver is shown
    Activated,
}

/// Inactivity timer of one kiosk station, controlling the screensaver overlay
///
/// The timer does not read the clock by itself; the current time is passed into every call.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    enabled: bool,
    last_activity: Instant,
    active: bool,
}

impl IdleTimer {
    pub fn new(timeout: Duration, enabled: bool, now: Instant) -> Self {
        Self {
            timeout,
            enabled,
            last_activity: now,
            active: false,
        }
    }

    /// A timer that never activates, e.g. for the mobile check-in view
    pub fn disabled(now: Instant) -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_SCREENSAVER_TIMEOUT_SECONDS as u64),
            false,
            now,
        )
    }

    /// Apply changed screensaver settings. Disabling the screensaver dismisses it.
    pub fn configure(&mut self, settings: &SystemSettings) {
        self.timeout = Duration::from_secs(settings.screensaver_timeout as u64);
        self.enabled = settings.screensaver_enabled;
        if !self.enabled {
            self.active = false;
        }
    }

    pub fn record_activity(&mut self, now: Instant) -> IdleTransition {
        self.last_activity = now;
        if self.active {
            self.active = false;
            IdleTransition::Dismissed
        } else {
            IdleTransition::Reset
        }
    }

    /// Check the timeout. Returns [IdleTransition::Activated] exactly once per idle period.
    pub fn poll(&mut self, now: Instant) -> Option<IdleTransition> {
        if !self.enabled || self.active {
            return None;
        }
        if now.saturating_duration_since(self.last_activity) >= self.timeout {
            self.active = true;
            return Some(IdleTransition::Activated);
        }
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
