//! Live events: server-sent events pushed to the kiosk browsers, and decoding of the backend's
//! own event stream.
use crate::kiosk::station::KioskId;
use actix_web::web::Bytes;
use futures::Stream;
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{channel, Receiver, Sender};

/// Events sent to kiosk browsers. On each event, the browser re-fetches the rendered kiosk panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskEvent {
    Presence,
    Announcements,
    News,
    /// Content or settings have changed; the browser reloads the whole page
    Refresh,
    /// The screensaver of one kiosk has been activated or dismissed
    Screensaver,
}

impl KioskEvent {
    pub fn name(&self) -> &'static str {
        match self {
            KioskEvent::Presence => "presence",
            KioskEvent::Announcements => "announcements",
            KioskEvent::News => "news",
            KioskEvent::Refresh => "refresh",
            KioskEvent::Screensaver => "screensaver",
        }
    }

    fn encode(&self) -> Bytes {
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.name(), self.name()))
    }
}

/// Fan-out of [KioskEvent]s to the connected kiosk browsers
#[derive(Default)]
pub struct Broadcaster {
    clients: Mutex<Vec<(KioskId, Sender<Bytes>)>>,
}

impl Broadcaster {
    fn lock(&self) -> MutexGuard<'_, Vec<(KioskId, Sender<Bytes>)>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new_client(&self, kiosk_id: &str) -> Client {
        let (tx, rx) = channel(100);
        // The channel is fresh, so it has capacity for this message.
        let _ = tx.try_send(Bytes::from("data: connected\n\n"));
        self.lock().push((kiosk_id.to_owned(), tx));
        Client(rx)
    }

    pub fn broadcast(&self, event: KioskEvent) {
        let msg = event.encode();
        for (_, client) in self.lock().iter() {
            client.try_send(msg.clone()).unwrap_or(());
        }
    }

    pub fn send_to(&self, kiosk_id: &str, event: KioskEvent) {
        let msg = event.encode();
        for (_, client) in self.lock().iter().filter(|(id, _)| id == kiosk_id) {
            client.try_send(msg.clone()).unwrap_or(());
        }
    }

    /// Ping all clients and drop those that have gone. Returns the ids of the kiosks whose last
    /// client has gone.
    pub fn remove_stale_clients(&self) -> Vec<KioskId> {
        let mut clients = self.lock();
        let mut gone: Vec<KioskId> = Vec::new();
        clients.retain(|(id, client)| {
            let alive = client.try_send(Bytes::from(": ping\n\n")).is_ok();
            if !alive {
                gone.push(id.clone());
            }
            alive
        });
        gone.sort();
        gone.dedup();
        gone.retain(|id| !clients.iter().any(|(other, _)| other == id));
        gone
    }

    /// Ids of the kiosks with at least one connected client
    pub fn connected_kiosks(&self) -> HashSet<KioskId> {
        self.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn client_count(&self) -> usize {
        self.lock().len()
    }
}

/// The event stream of one connected browser
pub struct Client(Receiver<Bytes>);

impl Stream for Client {
    type Item = Result<Bytes, actix_web::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.poll_recv(cx).map(|v| v.map(Ok))
    }
}

/// Events received from the backend's `/events/stream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Something was changed by an admin; cached content is outdated
    Refresh,
    Other(String),
}

impl BackendEvent {
    pub fn from_data(data: &str) -> Self {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(data) {
            return match value.get("type").and_then(|t| t.as_str()) {
                Some("refresh") => BackendEvent::Refresh,
                _ => BackendEvent::Other(data.to_owned()),
            };
        }
        // Some events arrive as single-quoted dict literals instead of JSON
        if data.contains("'type': 'refresh'") {
            BackendEvent::Refresh
        } else {
            BackendEvent::Other(data.to_owned())
        }
    }
}

/// Incremental decoder for a `text/event-stream` body, yielding the data of each complete event
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: String,
}

impl EventStreamDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer
            .push_str(&String::from_utf8_lossy(chunk).replace("\r\n", "\n"));
        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|value| value.strip_prefix(' ').unwrap_or(value))
                .collect();
            if !data.is_empty() {
                events.push(data.join("\n"));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_targeted_and_broadcast_events() {
        let broadcaster = Broadcaster::default();
        let mut a = broadcaster.new_client("a");
        let mut b = broadcaster.new_client("b");
        assert_eq!(
            a.next().await.unwrap().unwrap(),
            Bytes::from("data: connected\n\n")
        );
        b.next().await.unwrap().unwrap();

        broadcaster.send_to("b", KioskEvent::Screensaver);
        broadcaster.broadcast(KioskEvent::Presence);
        assert_eq!(
            a.next().await.unwrap().unwrap(),
            Bytes::from("event: presence\ndata: presence\n\n")
        );
        assert_eq!(
            b.next().await.unwrap().unwrap(),
            Bytes::from("event: screensaver\ndata: screensaver\n\n")
        );
    }

    #[test]
    fn test_remove_stale_clients_reports_abandoned_kiosks() {
        let broadcaster = Broadcaster::default();
        let a1 = broadcaster.new_client("a");
        let _a2 = broadcaster.new_client("a");
        let b = broadcaster.new_client("b");
        drop(a1);
        drop(b);
        assert_eq!(broadcaster.remove_stale_clients(), vec!["b".to_owned()]);
        assert_eq!(broadcaster.client_count(), 1);
    }

    #[test]
    fn test_decode_backend_stream() {
        let mut decoder = EventStreamDecoder::default();
        assert!(decoder.push(b"data: {\"type\": \"ref").is_empty());
        let events = decoder.push(b"resh\"}\n\ndata: {'type': 'refresh', 'timestamp': 'x'}\n\n: c");
        assert_eq!(events.len(), 2);
        assert_eq!(BackendEvent::from_data(&events[0]), BackendEvent::Refresh);
        assert_eq!(BackendEvent::from_data(&events[1]), BackendEvent::Refresh);
        assert!(decoder.push(b"\n\n").is_empty());
        assert_eq!(
            BackendEvent::from_data("{\"type\": \"other\"}"),
            BackendEvent::Other("{\"type\": \"other\"}".to_owned())
        );
    }
}
