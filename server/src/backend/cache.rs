use crate::backend::{AttendanceBackend, BackendError};
use ffw_checkin_api_types::content::{Announcement, News};
use ffw_checkin_api_types::settings::{StationSettings, SystemSettings};
use log::debug;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cache for the entities shown on every kiosk page
///
/// Values are fetched from the backend on first use and kept until [EntityCache::invalidate] is
/// called (after admin changes or when the backend announces a kiosk refresh) or until they are
/// replaced by one of the `refresh_*` functions (used by the periodic pollers).
///
/// Each invalidation increments a generation counter. A fetch that was started before an
/// invalidation does not store its (possibly outdated) result.
pub struct EntityCache {
    backend: Arc<dyn AttendanceBackend>,
    entries: Mutex<CacheEntries>,
}

#[derive(Default)]
struct CacheEntries {
    generation: u64,
    station: Option<StationSettings>,
    system: Option<SystemSettings>,
    announcements: Option<Vec<Announcement>>,
    news: Option<Vec<News>>,
}

impl EntityCache {
    pub fn new(backend: Arc<dyn AttendanceBackend>) -> Self {
        Self {
            backend,
            entries: Mutex::new(CacheEntries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop all cached values
    pub fn invalidate(&self) {
        let mut entries = self.lock();
        *entries = CacheEntries {
            generation: entries.generation + 1,
            ..Default::default()
        };
        debug!("Entity cache invalidated (generation {})", entries.generation);
    }

    async fn get_or_fetch<T, F, Fut>(
        &self,
        slot: fn(&mut CacheEntries) -> &mut Option<T>,
        fetch: F,
    ) -> Result<T, BackendError>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let generation = {
            let mut entries = self.lock();
            if let Some(value) = slot(&mut entries) {
                return Ok(value.clone());
            }
            entries.generation
        };
        let value = fetch().await?;
        self.store(slot, value.clone(), Some(generation));
        Ok(value)
    }

    /// Store a value, unless the cache has been invalidated since `fetched_in_generation`
    fn store<T>(
        &self,
        slot: fn(&mut CacheEntries) -> &mut Option<T>,
        value: T,
        fetched_in_generation: Option<u64>,
    ) {
        let mut entries = self.lock();
        if fetched_in_generation.map_or(true, |g| g == entries.generation) {
            *slot(&mut entries) = Some(value);
        }
    }

    pub async fn station_settings(&self) -> Result<StationSettings, BackendError> {
        self.get_or_fetch(|e| &mut e.station, || self.backend.station_settings())
            .await
    }

    pub async fn system_settings(&self) -> Result<SystemSettings, BackendError> {
        self.get_or_fetch(|e| &mut e.system, || self.backend.system_settings())
            .await
    }

    pub async fn announcements(&self) -> Result<Vec<Announcement>, BackendError> {
        self.get_or_fetch(
            |e| &mut e.announcements,
            || self.backend.active_announcements(),
        )
        .await
    }

    pub async fn news(&self) -> Result<Vec<News>, BackendError> {
        self.get_or_fetch(|e| &mut e.news, || self.backend.news(true))
            .await
    }

    /// Fetch the active announcements from the backend and replace the cached list
    pub async fn refresh_announcements(&self) -> Result<Vec<Announcement>, BackendError> {
        let announcements = self.backend.active_announcements().await?;
        self.store(|e| &mut e.announcements, announcements.clone(), None);
        Ok(announcements)
    }

    /// Fetch the active news from the backend and replace the cached list
    pub async fn refresh_news(&self) -> Result<Vec<News>, BackendError> {
        let news = self.backend.news(true).await?;
        self.store(|e| &mut e.news, news.clone(), None);
        Ok(news)
    }
}
