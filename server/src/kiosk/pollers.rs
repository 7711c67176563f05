//! Periodic background tasks feeding the [KioskHub].
//!
//! Every task only holds a [Weak] reference to the hub and exits as soon as the hub is gone.
//! Failures are logged and retried at the next tick. Dropping the [PollerSet] aborts all tasks.
use crate::kiosk::events::{BackendEvent, EventStreamDecoder};
use crate::kiosk::KioskHub;
use futures::StreamExt;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
pub struct PollIntervals {
    pub presence: Duration,
    pub announcements_refresh: Duration,
    pub announcements_rotation: Duration,
    pub news_refresh: Duration,
    pub news_rotation: Duration,
    pub version_check: Duration,
    pub idle_tick: Duration,
    pub client_ping: Duration,
    pub event_stream_reconnect: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            presence: Duration::from_secs(5),
            announcements_refresh: Duration::from_secs(5 * 60),
            announcements_rotation: Duration::from_secs(10),
            news_refresh: Duration::from_secs(60),
            news_rotation: Duration::from_secs(10),
            version_check: Duration::from_secs(5 * 60),
            idle_tick: Duration::from_secs(1),
            client_ping: Duration::from_secs(10),
            event_stream_reconnect: Duration::from_secs(5),
        }
    }
}

pub struct PollerSet {
    handles: Vec<JoinHandle<()>>,
}

impl PollerSet {
    /// Spawn all periodic kiosk tasks on the current tokio runtime
    pub fn start(hub: &Arc<KioskHub>, intervals: &PollIntervals) -> Self {
        let handles = vec![
            spawn_periodic(hub, intervals.presence, |hub| async move {
                if let Err(e) = hub.poll_presence().await {
                    warn!("Presence poll failed: {}", e);
                }
            }),
            spawn_periodic(hub, intervals.announcements_refresh, |hub| async move {
                if let Err(e) = hub.refresh_announcements().await {
                    warn!("Announcement refresh failed: {}", e);
                }
            }),
            spawn_periodic(hub, intervals.announcements_rotation, |hub| async move {
                hub.rotate_announcements(Instant::now());
            }),
            spawn_periodic(hub, intervals.news_refresh, |hub| async move {
                if let Err(e) = hub.refresh_news().await {
                    warn!("News refresh failed: {}", e);
                }
            }),
            spawn_periodic(hub, intervals.news_rotation, |hub| async move {
                hub.rotate_news(Instant::now());
            }),
            spawn_periodic(hub, intervals.version_check, |hub| async move {
                if let Err(e) = hub.check_version().await {
                    warn!("Version check failed: {}", e);
                }
            }),
            spawn_periodic(hub, intervals.idle_tick, |hub| async move {
                hub.idle_tick(Instant::now());
            }),
            spawn_periodic(hub, intervals.client_ping, |hub| async move {
                hub.remove_stale_clients(Instant::now());
            }),
            spawn_event_listener(Arc::downgrade(hub), intervals.event_stream_reconnect),
        ];
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for PollerSet {
    fn drop(&mut self) {
        for handle in self.handles.iter() {
            handle.abort();
        }
    }
}

fn spawn_periodic<F, Fut>(hub: &Arc<KioskHub>, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn(Arc<KioskHub>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let hub = Arc::downgrade(hub);
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now(), period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(hub) = hub.upgrade() else {
                debug!("Kiosk hub is gone. Stopping periodic task.");
                break;
            };
            job(hub).await;
        }
    })
}

/// Listen to the backend's event stream and reconnect after `reconnect_delay` whenever it ends
fn spawn_event_listener(hub: Weak<KioskHub>, reconnect_delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(strong) = hub.upgrade() else {
                break;
            };
            let stream = strong.backend.event_stream().await;
            drop(strong);
            match stream {
                Ok(mut stream) => {
                    info!("Connected to backend event stream");
                    let mut decoder = EventStreamDecoder::default();
                    while let Some(chunk) = stream.next().await {
                        let chunk = match chunk {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                warn!("Backend event stream failed: {}", e);
                                break;
                            }
                        };
                        let Some(strong) = hub.upgrade() else {
                            return;
                        };
                        for data in decoder.push(&chunk) {
                            strong.handle_backend_event(BackendEvent::from_data(&data)).await;
                        }
                    }
                }
                Err(e) => warn!("Could not connect to backend event stream: {}", e),
            }
            tokio::time::sleep(reconnect_delay).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::sample_data;
    use crate::kiosk::events::KioskEvent;
    use crate::kiosk::station::DisplayMode;
    use ffw_checkin_api_types::settings::SystemSettings;

    #[tokio::test(start_paused = true)]
    async fn test_pollers_run_periodically() {
        let backend = Arc::new(sample_data::backend_with_sample_data());
        let hub = Arc::new(KioskHub::new(backend.clone()));
        let pollers = PollerSet::start(&hub, &PollIntervals::default());
        assert_eq!(pollers.len(), 9);

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        // Ticks at 0 s, 5 s and 10 s
        assert_eq!(backend.call_count("active_sessions"), 3);
        assert_eq!(backend.call_count("active_announcements"), 1);
        assert_eq!(backend.call_count("news"), 1);

        drop(pollers);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.call_count("active_sessions"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_stop_when_hub_is_gone() {
        let backend = Arc::new(sample_data::backend_with_sample_data());
        let hub = Arc::new(KioskHub::new(backend.clone()));
        let _pollers = PollerSet::start(&hub, &PollIntervals::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(hub);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.call_count("active_sessions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tick_activates_screensaver() {
        let backend = Arc::new(sample_data::backend_with_sample_data());
        backend.data.lock().unwrap().system = SystemSettings {
            screensaver_timeout: 30,
            ..SystemSettings::default()
        };
        let hub = Arc::new(KioskHub::new(backend.clone()));
        hub.open_station("k1", DisplayMode::Station, Instant::now())
            .await;
        let mut client = hub.broadcaster.new_client("k1");
        let _pollers = PollerSet::start(&hub, &PollIntervals::default());

        tokio::time::sleep(Duration::from_millis(31_500)).await;
        assert!(hub.registry.snapshot("k1").unwrap().idle.is_active());

        let mut events = Vec::new();
        while let Some(Ok(bytes)) = futures::FutureExt::now_or_never(client.next()).flatten() {
            events.push(bytes);
        }
        let screensaver = actix_web::web::Bytes::from(format!(
            "event: {}\ndata: {}\n\n",
            KioskEvent::Screensaver.name(),
            KioskEvent::Screensaver.name()
        ));
        assert!(events.contains(&screensaver));

        hub.record_activity("k1", Instant::now());
        assert!(!hub.registry.snapshot("k1").unwrap().idle.is_active());
    }

    #[tokio::test]
    async fn test_backend_refresh_event_invalidates_cache() {
        let backend = Arc::new(sample_data::backend_with_sample_data());
        backend.data.lock().unwrap().event_chunks =
            vec!["data: {\"type\": \"refresh\"}\n\n".to_owned()];
        let hub = Arc::new(KioskHub::new(backend.clone()));
        hub.cache.station_settings().await.unwrap();
        backend.data.lock().unwrap().station.name = "FF Neustadt".to_owned();

        let _pollers = PollerSet::start(&hub, &PollIntervals::default());
        for _ in 0..50 {
            if hub.cache.station_settings().await.unwrap().name == "FF Neustadt" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(hub.cache.station_settings().await.unwrap().name, "FF Neustadt");
    }
}
