// Relay service - routes source-channel posts.
//
// "#start" / "#stop" toggle the scheduler, anything else is content and goes
// to the back of the queue whether or not relaying is on.

use super::content_queue::ContentQueue;
use super::relay_models::{ChannelPost, ControlMarker, PostDisposition, QueuedContent};
use super::relay_scheduler::RelayScheduler;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub struct RelayService {
    scheduler: Arc<RelayScheduler>,
    queue: Arc<ContentQueue>,
}

impl RelayService {
    pub fn new(scheduler: Arc<RelayScheduler>, queue: Arc<ContentQueue>) -> Self {
        Self { scheduler, queue }
    }

    pub fn handle_post(&self, post: &ChannelPost, now: DateTime<Utc>) -> PostDisposition {
        let text = post.text.as_deref().unwrap_or("");
        info!(chat_id = post.chat_id, message_id = post.message_id, "Channel post received");

        match ControlMarker::parse(text) {
            Some(ControlMarker::Start) => {
                if self.scheduler.start() {
                    PostDisposition::Started
                } else {
                    PostDisposition::AlreadyRunning
                }
            }
            Some(ControlMarker::Stop) => {
                if self.scheduler.stop() {
                    PostDisposition::Stopped
                } else {
                    PostDisposition::AlreadyStopped
                }
            }
            None => {
                let queue_len = self.queue.enqueue(QueuedContent {
                    source_chat_id: post.chat_id,
                    message_id: post.message_id,
                    enqueued_at: now,
                });
                info!(queue_len, "Content queued");
                PostDisposition::Queued { queue_len }
            }
        }
    }

    /// Stop relaying, e.g. on shutdown.
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relay::relay_models::RelayConfig;
    use crate::core::test_support::{ManualTimer, MockGateway};

    const SOURCE: i64 = -1_000;

    struct Harness {
        gateway: Arc<MockGateway>,
        timer: Arc<ManualTimer>,
        relay: RelayService,
    }

    fn harness() -> Harness {
        let gateway = Arc::new(MockGateway::new());
        let timer = Arc::new(ManualTimer::new());
        let queue = Arc::new(ContentQueue::new());
        let scheduler = RelayScheduler::new(
            queue.clone(),
            gateway.clone(),
            timer.clone(),
            RelayConfig {
                target_chat_id: Some(-2_000),
                ..RelayConfig::default()
            },
        );
        Harness {
            gateway,
            timer,
            relay: RelayService::new(scheduler, queue),
        }
    }

    fn post(message_id: i64, text: Option<&str>) -> ChannelPost {
        ChannelPost {
            chat_id: SOURCE,
            message_id,
            text: text.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_double_start_keeps_one_job() {
        let h = harness();
        let now = Utc::now();

        assert_eq!(h.relay.handle_post(&post(1, Some("#start")), now), PostDisposition::Started);
        assert_eq!(
            h.relay.handle_post(&post(2, Some(" #START ")), now),
            PostDisposition::AlreadyRunning
        );
        assert_eq!(h.timer.active_jobs(), 1);
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_a_no_op() {
        let h = harness();
        let now = Utc::now();

        assert_eq!(
            h.relay.handle_post(&post(1, Some("#stop")), now),
            PostDisposition::AlreadyStopped
        );
        h.relay.handle_post(&post(2, Some("#start")), now);
        assert_eq!(h.relay.handle_post(&post(3, Some("#stop")), now), PostDisposition::Stopped);
        assert_eq!(h.timer.active_jobs(), 0);
        assert!(!h.relay.is_running());
    }

    #[tokio::test]
    async fn test_posts_queue_before_start_and_relay_in_order() {
        let h = harness();
        let now = Utc::now();

        assert_eq!(
            h.relay.handle_post(&post(10, Some("A")), now),
            PostDisposition::Queued { queue_len: 1 }
        );
        // Media posts without text are content too.
        h.relay.handle_post(&post(11, None), now);
        h.relay.handle_post(&post(12, Some("C")), now);
        assert!(h.gateway.copied().is_empty());

        h.relay.handle_post(&post(13, Some("#start")), now);
        for _ in 0..3 {
            h.timer.fire_all().await;
        }

        assert_eq!(h.gateway.copied(), vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_stop_halts_relay_even_if_ticks_keep_firing() {
        let h = harness();
        let now = Utc::now();

        for id in 1..=3 {
            h.relay.handle_post(&post(id, Some("content")), now);
        }
        h.relay.handle_post(&post(4, Some("#start")), now);
        h.timer.fire_all().await;
        h.relay.handle_post(&post(5, Some("#stop")), now);

        h.timer.fire_cancelled().await;
        h.timer.fire_all().await;

        assert_eq!(h.gateway.copied(), vec![1]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_scheduler() {
        let h = harness();
        h.relay.handle_post(&post(1, Some("#start")), Utc::now());

        h.relay.shutdown();

        assert!(!h.relay.is_running());
        assert_eq!(h.timer.active_jobs(), 0);
    }
}
