//! Debounced delivery of preview updates.

use std::time::Duration;

use tokio::sync::mpsc;

use super::PreviewContent;

/// Merges content pushed in quick succession and emits it once the queue has
/// been quiet for `window`. The task stops after `idle` without any push.
#[derive(Debug, Clone)]
pub struct ContentCoalescer {
    tx: mpsc::UnboundedSender<PreviewContent>,
}

impl ContentCoalescer {
    /// Start the coalescing task. Merged content arrives on the returned
    /// receiver, which closes once the task stops.
    pub fn spawn(window: Duration, idle: Duration) -> (Self, mpsc::Receiver<PreviewContent>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PreviewContent>();
        let (out_tx, out_rx) = mpsc::channel(16);

        tokio::spawn(async move {
            loop {
                let first = match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(content)) => content,
                    Ok(None) => break,
                    Err(_) => {
                        // Refuse new pushes, but keep one that raced the timeout.
                        rx.close();
                        match rx.try_recv() {
                            Ok(content) => content,
                            Err(_) => break,
                        }
                    }
                };
                let mut pending = first;
                let closed = loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(content) => pending.merge(content),
                            None => break true,
                        },
                        _ = tokio::time::sleep(window) => break false,
                    }
                };

                if out_tx.send(pending).await.is_err() || closed {
                    break;
                }
            }
        });

        (Self { tx }, out_rx)
    }

    /// Queue content. Returns false once the coalescing task has stopped.
    pub fn push(&self, content: PreviewContent) -> bool {
        self.tx.send(content).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(60);

    fn text(key: &str, value: &str) -> PreviewContent {
        PreviewContent {
            texts: [(key.to_string(), value.to_string())].into(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_are_merged() {
        let (queue, mut out) = ContentCoalescer::spawn(Duration::from_millis(100), IDLE);

        queue.push(text("a", "1"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        queue.push(text("a", "2"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        queue.push(text("b", "3"));

        let merged = out.recv().await.unwrap();
        assert_eq!(merged.texts["a"], "2");
        assert_eq!(merged.texts["b"], "3");
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_window_separates_batches() {
        let (queue, mut out) = ContentCoalescer::spawn(Duration::from_millis(50), IDLE);

        queue.push(text("a", "1"));
        let first = out.recv().await.unwrap();
        assert_eq!(first.texts["a"], "1");

        tokio::time::sleep(Duration::from_millis(200)).await;
        queue.push(text("a", "2"));
        let second = out.recv().await.unwrap();
        assert_eq!(second.texts["a"], "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_emitted_before_window() {
        let (queue, mut out) = ContentCoalescer::spawn(Duration::from_millis(100), IDLE);
        queue.push(text("a", "1"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(out.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(out.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_idle() {
        let (queue, mut out) = ContentCoalescer::spawn(Duration::from_millis(50), IDLE);
        queue.push(text("a", "1"));
        assert!(out.recv().await.is_some());

        tokio::time::sleep(IDLE * 2).await;
        assert!(out.recv().await.is_none());
        assert!(queue.is_closed());
        assert!(!queue.push(text("a", "2")));
    }
}
