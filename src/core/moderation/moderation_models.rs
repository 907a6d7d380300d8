// Moderation domain models - data structures for the anti-abuse pipeline.
//
// These are pure domain types with no Telegram dependencies.
// The telegram layer converts platform updates into these.

use crate::core::gateway::{ActionOutcome, ChatId, MessageId, UserId};
use chrono::{DateTime, Utc};
use std::time::Duration;

// ============================================================================
// INBOUND EVENTS
// ============================================================================

/// Who sent a message.
#[derive(Debug, Clone)]
pub struct Sender {
    pub user_id: UserId,
    pub first_name: String,
    pub is_bot: bool,
}

/// A message posted in a moderated group.
#[derive(Debug, Clone)]
pub struct GroupMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Sender,
    /// Absent for stickers, photos without captions, service messages...
    pub text: Option<String>,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// What the text classifier thinks of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    LinkViolation,
    /// Not a violation - only triggers an admin-contact notice.
    KeywordAlert,
}

/// Raw markers found in a message. Link and keyword are independent: one
/// message can carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextScan {
    pub has_link: bool,
    pub has_urgent_keyword: bool,
}

/// A detected abuse event that feeds the escalation ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    LinkSharing,
    Spamming,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::LinkSharing => write!(f, "Link sharing"),
            Violation::Spamming => write!(f, "Spamming"),
        }
    }
}

// ============================================================================
// ESCALATION
// ============================================================================

/// What the ledger wants done about a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationAction {
    /// Temporary restriction. `warning_number` is out of `max_warnings`.
    Mute {
        duration: Duration,
        warning_number: u32,
        max_warnings: u32,
    },
    Ban,
}

/// Per-user warning counter.
///
/// Never observably above the configured maximum: the violation that would
/// push it over becomes a ban and the counter goes back to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscalationState {
    pub warning_count: u32,
}

/// Per-user message timestamps inside the spam window.
#[derive(Debug, Clone, Default)]
pub struct UserActivity {
    pub timestamps: std::collections::VecDeque<DateTime<Utc>>,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Behaviour switches that let one engine cover every bot variant we run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationPolicy {
    /// Pin messages sent by admins and creators.
    pub pin_admin_messages: bool,
    /// Run the message-rate check. When off the pipeline is link-only.
    pub spam_detection: bool,
    /// Ban once warnings run out. When off, every violation is a mute.
    pub ban_escalation: bool,
    /// Greet people joining the group.
    pub welcome_new_members: bool,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            pin_admin_messages: true,
            spam_detection: true,
            ban_escalation: true,
            welcome_new_members: true,
        }
    }
}

/// Tunables for spam detection, escalation and per-user tracking.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Messages within the window that count as spam
    pub spam_message_limit: usize,
    /// Spam window in seconds
    pub spam_window_secs: u64,
    /// How long a mute lasts (seconds)
    pub mute_duration_secs: u64,
    /// Mutes handed out before the next violation becomes a ban
    pub max_warnings: u32,
    /// Who users are pointed at when they ask for help
    pub admin_contact: Option<UserId>,
    /// Most users tracked at once per table
    pub tracked_users_cap: usize,
    /// Users idle for longer than this may be forgotten (seconds)
    pub tracked_user_ttl_secs: u64,
    pub policy: ModerationPolicy,
}

impl ModerationConfig {
    pub fn spam_window(&self) -> chrono::Duration {
        seconds_saturating(self.spam_window_secs)
    }

    pub fn mute_duration(&self) -> Duration {
        Duration::from_secs(self.mute_duration_secs)
    }

    pub fn tracked_user_ttl(&self) -> chrono::Duration {
        seconds_saturating(self.tracked_user_ttl_secs)
    }
}

/// Whole seconds as a chrono duration, clamped to the largest one chrono holds.
fn seconds_saturating(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            spam_message_limit: 5,        // 5 messages...
            spam_window_secs: 10,         // ...in 10 seconds
            mute_duration_secs: 300,      // 5 minute mute
            max_warnings: 2,              // third strike is a ban
            admin_contact: None,
            tracked_users_cap: 10_000,
            tracked_user_ttl_secs: 3_600,
            policy: ModerationPolicy::default(),
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// How the pipeline disposed of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationVerdict {
    /// No text to look at.
    Ignored,
    /// Sender is an admin or creator.
    Exempt,
    /// Bot command, deleted silently.
    CommandRemoved,
    Clean,
    Punished {
        violation: Violation,
        action: EscalationAction,
    },
}

/// Everything the pipeline decided and did for one message.
#[derive(Debug, Clone)]
pub struct ModerationReport {
    pub verdict: ModerationVerdict,
    /// Whether the help/urgent notice went out
    pub alerted: bool,
    /// Each platform action that was attempted, in order
    pub actions: Vec<(&'static str, ActionOutcome)>,
}

impl ModerationReport {
    pub fn new(verdict: ModerationVerdict) -> Self {
        Self {
            verdict,
            alerted: false,
            actions: Vec::new(),
        }
    }

    pub fn record(&mut self, action: &'static str, outcome: ActionOutcome) {
        self.actions.push((action, outcome));
    }

    /// Names of the actions that failed.
    pub fn failures(&self) -> Vec<&'static str> {
        self.actions
            .iter()
            .filter(|(_, outcome)| !outcome.is_applied())
            .map(|(name, _)| *name)
            .collect()
    }
}
