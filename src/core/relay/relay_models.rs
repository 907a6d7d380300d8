// Relay domain models.

use crate::core::gateway::{ActionOutcome, ChatId, MessageId};
use crate::core::timer::JobHandle;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A post seen in the source channel.
#[derive(Debug, Clone)]
pub struct ChannelPost {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
}

/// Reference to a channel post waiting to be relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedContent {
    pub source_chat_id: ChatId,
    pub message_id: MessageId,
    pub enqueued_at: DateTime<Utc>,
}

/// Control markers posted in the source channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMarker {
    Start,
    Stop,
}

impl ControlMarker {
    pub const START: &'static str = "#start";
    pub const STOP: &'static str = "#stop";

    /// Recognise a marker. The whole post must be the marker, give or take
    /// case and surrounding whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            Self::START => Some(ControlMarker::Start),
            Self::STOP => Some(ControlMarker::Stop),
            _ => None,
        }
    }
}

/// Scheduler state.
///
/// `job` is set exactly when a repeating relay job is scheduled, and there is
/// never more than one. `generation` changes on every start and stop so a tick
/// from an old job can tell it has been superseded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    pub enabled: bool,
    pub job: Option<JobHandle>,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Where relayed posts go. Unset is a configuration error, logged per tick.
    pub target_chat_id: Option<ChatId>,
    pub interval_secs: u64,
    pub first_delay_secs: u64,
}

impl RelayConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn first_delay(&self) -> Duration {
        Duration::from_secs(self.first_delay_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            target_chat_id: None,
            interval_secs: 30,
            first_delay_secs: 10,
        }
    }
}

/// What happened to a channel post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDisposition {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
    Queued { queue_len: usize },
}

/// What one tick of the relay job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Relay is switched off.
    Disabled,
    /// Tick belongs to a job that has since been replaced or cancelled.
    Stale,
    Empty,
    NoTarget,
    Relayed {
        message_id: MessageId,
        outcome: ActionOutcome,
    },
}
