//! Per-template preview state shared by the HTTP handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use super::{ContentCoalescer, EditorMessage, PreviewContent, PreviewMessage, PreviewSurface};
use crate::events::{EventHub, ServerEvent};

type Surfaces = Arc<Mutex<HashMap<String, PreviewSurface>>>;
type Queues = Arc<Mutex<HashMap<String, ContentCoalescer>>>;

/// How long a template's update queue lives without pushes.
const QUEUE_IDLE: Duration = Duration::from_secs(300);

/// Snapshot of a template's mirrored preview.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub ready: bool,
    pub highlighted: Option<String>,
    /// Elements changed by the update still waiting for delivery
    pub pending: Vec<String>,
}

/// Mirrors each rendered template as a [`PreviewSurface`] and feeds content
/// updates through one [`ContentCoalescer`] per template. Merged updates reach
/// SSE subscribers as `previewUpdate` events. Idle queues are dropped and
/// respawned on the next push.
#[derive(Debug)]
pub struct PreviewHub {
    window: Duration,
    events: Arc<EventHub>,
    surfaces: Surfaces,
    queues: Queues,
}

impl PreviewHub {
    pub fn new(window: Duration, events: Arc<EventHub>) -> Self {
        Self {
            window,
            events,
            surfaces: Arc::new(Mutex::new(HashMap::new())),
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Mirror freshly rendered template HTML.
    pub fn attach(&self, template_id: &str, html: &str) {
        lock(&self.surfaces).insert(template_id.to_string(), PreviewSurface::from_html(html));
    }

    /// Apply `INIT_PREVIEW` to the mirror, if the template was rendered.
    pub fn init(&self, template_id: &str, message: EditorMessage) -> Option<PreviewMessage> {
        lock(&self.surfaces)
            .get_mut(template_id)
            .and_then(|surface| surface.apply(message).reply)
    }

    /// Queue content for subscribers. With a mirror, content that changes
    /// nothing is dropped. Returns whether anything was queued.
    pub fn push(&self, template_id: &str, mut content: PreviewContent) -> bool {
        if let Some(surface) = lock(&self.surfaces).get_mut(template_id) {
            let outcome = surface.apply(EditorMessage::UpdateContent {
                data: content.clone(),
                selected_element_id: None,
            });
            content.texts.retain(|id, _| outcome.changed.contains(id));
            content.images.retain(|id, _| outcome.changed.contains(id));
            content.colors.retain(|id, _| outcome.changed.contains(id));
        }
        if content.is_empty() {
            return false;
        }

        let mut queues = lock(&self.queues);
        if let Some(queue) = queues.get(template_id) {
            if queue.push(content.clone()) {
                return true;
            }
        }

        let queue = self.spawn_queue(template_id);
        let queued = queue.push(content);
        queues.insert(template_id.to_string(), queue);
        queued
    }

    /// A click inside the preview. `None` for unknown elements or unrendered templates.
    pub fn select(&self, template_id: &str, element_id: &str) -> Option<PreviewMessage> {
        let message = lock(&self.surfaces)
            .get_mut(template_id)?
            .select(element_id)?;
        self.events.broadcast(ServerEvent::PreviewSelection {
            template_id: template_id.to_string(),
            message: message.clone(),
        });
        Some(message)
    }

    pub fn state(&self, template_id: &str) -> Option<PreviewState> {
        lock(&self.surfaces)
            .get(template_id)
            .map(|surface| PreviewState {
                ready: surface.is_ready(),
                highlighted: surface.highlighted().map(str::to_string),
                pending: surface.flashed().iter().cloned().collect(),
            })
    }

    fn spawn_queue(&self, template_id: &str) -> ContentCoalescer {
        let (queue, mut merged) = ContentCoalescer::spawn(self.window, QUEUE_IDLE);
        let events = self.events.clone();
        let surfaces = self.surfaces.clone();
        let queues = self.queues.clone();
        let id = template_id.to_string();

        tokio::spawn(async move {
            while let Some(data) = merged.recv().await {
                events.broadcast(ServerEvent::PreviewUpdate {
                    template_id: id.clone(),
                    message: EditorMessage::UpdateContent {
                        data,
                        selected_element_id: None,
                    },
                });
                if let Some(surface) = lock(&surfaces).get_mut(&id) {
                    surface.clear_flash();
                }
            }

            let mut queues = lock(&queues);
            if queues.get(&id).is_some_and(ContentCoalescer::is_closed) {
                queues.remove(&id);
                tracing::debug!("Dropped idle preview queue for {}", id);
            }
        });

        queue
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<h1 data-element-id=\"title\">Hello</h1><p id=\"intro\">Intro</p>";

    fn text(key: &str, value: &str) -> PreviewContent {
        PreviewContent {
            texts: [(key.to_string(), value.to_string())].into(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_merged_update_is_broadcast() {
        let events = Arc::new(EventHub::new());
        let mut subscription = events.subscribe();
        let hub = PreviewHub::new(Duration::from_millis(100), events.clone());

        assert!(hub.push("demo", text("a", "1")));
        assert!(hub.push("demo", text("a", "2")));

        match subscription.recv().await.unwrap() {
            ServerEvent::PreviewUpdate {
                template_id,
                message: EditorMessage::UpdateContent { data, .. },
            } => {
                assert_eq!(template_id, "demo");
                assert_eq!(data.texts["a"], "2");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mirror_drops_unchanged_content() {
        let hub = PreviewHub::new(Duration::from_millis(100), Arc::new(EventHub::new()));
        hub.attach("demo", PAGE);

        assert!(!hub.push("demo", text("title", "Hello")));
        assert!(!hub.push("demo", text("unknown", "x")));
        assert!(hub.push("demo", text("title", "Hi")));
        assert_eq!(hub.state("demo").unwrap().pending, vec!["title".to_string()]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(hub.state("demo").unwrap().pending.is_empty());
    }

    #[tokio::test]
    async fn test_init_and_select() {
        let events = Arc::new(EventHub::new());
        let mut subscription = events.subscribe();
        let hub = PreviewHub::new(Duration::from_millis(10), events.clone());

        assert!(hub.init("demo", EditorMessage::InitPreview {
            data: PreviewContent::default(),
            selected_element_id: None,
        })
        .is_none());

        hub.attach("demo", PAGE);
        let reply = hub.init(
            "demo",
            EditorMessage::InitPreview {
                data: PreviewContent::default(),
                selected_element_id: None,
            },
        );
        assert_eq!(reply, Some(PreviewMessage::PreviewReady {}));

        assert!(hub.select("demo", "missing").is_none());
        assert_eq!(
            hub.select("demo", "intro"),
            Some(PreviewMessage::ElementSelected {
                element_id: "intro".to_string()
            })
        );
        let state = hub.state("demo").unwrap();
        assert!(state.ready);
        assert_eq!(state.highlighted.as_deref(), Some("intro"));

        assert!(matches!(
            subscription.recv().await,
            Some(ServerEvent::PreviewSelection { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_queue_is_dropped_and_respawned() {
        let events = Arc::new(EventHub::new());
        let mut subscription = events.subscribe();
        let hub = PreviewHub::new(Duration::from_millis(50), events.clone());

        assert!(hub.push("demo", text("a", "1")));
        assert!(subscription.recv().await.is_some());
        assert_eq!(lock(&hub.queues).len(), 1);

        tokio::time::sleep(QUEUE_IDLE + Duration::from_secs(1)).await;
        for _ in 0..10 {
            if lock(&hub.queues).is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(lock(&hub.queues).is_empty());

        assert!(hub.push("demo", text("a", "2")));
        match subscription.recv().await.unwrap() {
            ServerEvent::PreviewUpdate {
                message: EditorMessage::UpdateContent { data, .. },
                ..
            } => assert_eq!(data.texts["a"], "2"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
