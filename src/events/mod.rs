//! Server-sent change notifications.
//!
//! Every connected client holds a [`Subscription`]. Mutations broadcast a
//! [`ServerEvent`] to all of them; a subscriber whose channel is closed or
//! backed up is dropped from the registry.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::preview::{EditorMessage, PreviewMessage};

const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    WatchingStarted {
        timestamp: i64,
    },
    TemplateChange {
        template_id: String,
        change: String,
        timestamp: i64,
    },
    PreviewUpdate {
        template_id: String,
        message: EditorMessage,
    },
    PreviewSelection {
        template_id: String,
        message: PreviewMessage,
    },
}

impl ServerEvent {
    pub fn template_change(template_id: &str, change: &str) -> Self {
        ServerEvent::TemplateChange {
            template_id: template_id.to_string(),
            change: change.to_string(),
            timestamp: crate::store::now_millis(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::WatchingStarted { .. } => "watchingStarted",
            ServerEvent::TemplateChange { .. } => "templateChange",
            ServerEvent::PreviewUpdate { .. } => "previewUpdate",
            ServerEvent::PreviewSelection { .. } => "previewSelection",
        }
    }

    fn to_sse(&self) -> Event {
        Event::default()
            .event(self.name())
            .json_data(self)
            .unwrap_or_else(|_| Event::default().event("error").data("JSON encoding failed"))
    }
}

type Registry = Arc<Mutex<HashMap<u64, mpsc::Sender<ServerEvent>>>>;

#[derive(Debug, Default)]
pub struct EventHub {
    next_id: AtomicU64,
    subscribers: Registry,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.registry().insert(id, tx);
        tracing::debug!("Event subscriber {} connected", id);

        Subscription {
            rx,
            guard: SubscriberGuard {
                id,
                subscribers: self.subscribers.clone(),
            },
        }
    }

    /// Best-effort delivery to every subscriber.
    pub fn broadcast(&self, event: ServerEvent) {
        let mut subscribers = self.registry();
        subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Dropping event subscriber {}: {}", id, e);
                false
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<ServerEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the subscriber from the registry when dropped.
#[derive(Debug)]
struct SubscriberGuard {
    id: u64,
    subscribers: Registry,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        tracing::debug!("Event subscriber {} disconnected", self.id);
    }
}

#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<ServerEvent>,
    guard: SubscriberGuard,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.rx.recv().await
    }

    /// SSE response: `watchingStarted` first, then every broadcast event.
    pub fn into_sse(self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let Subscription { rx, guard } = self;
        let started = ServerEvent::WatchingStarted {
            timestamp: crate::store::now_millis(),
        };

        let events = ReceiverStream::new(rx).map(move |event| {
            let _connected = &guard;
            Ok(event.to_sse())
        });
        let stream = stream::once(async move { Ok(started.to_sse()) }).chain(events);

        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let hub = EventHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.broadcast(ServerEvent::template_change("demo", "versionCreated"));

        for sub in [&mut a, &mut b] {
            match sub.recv().await.unwrap() {
                ServerEvent::TemplateChange {
                    template_id,
                    change,
                    ..
                } => {
                    assert_eq!(template_id, "demo");
                    assert_eq!(change, "versionCreated");
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_dropped_subscription_is_removed() {
        let hub = EventHub::new();
        let first = hub.subscribe();
        let _second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(first);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_backed_up_subscriber_is_dropped() {
        let hub = EventHub::new();
        let _slow = hub.subscribe();
        for _ in 0..=SUBSCRIBER_BUFFER {
            hub.broadcast(ServerEvent::template_change("demo", "workingSaved"));
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_event_payload_shape() {
        let event = ServerEvent::TemplateChange {
            template_id: "demo".to_string(),
            change: "contentUpdated".to_string(),
            timestamp: 42,
        };
        assert_eq!(event.name(), "templateChange");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "templateChange",
                "templateId": "demo",
                "change": "contentUpdated",
                "timestamp": 42
            })
        );
    }
}
