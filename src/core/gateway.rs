// Gateway port - the narrow slice of the messaging platform the core needs.
//
// The core never sees Telegram types. It asks the gateway about membership and
// tells it to delete, restrict, ban, send, copy and pin. The infra layer
// provides the real implementation over the Bot API.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub type ChatId = i64;
pub type UserId = i64;
pub type MessageId = i64;

// ============================================================================
// DOMAIN TYPES
// ============================================================================

/// A user's membership status in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    Other,
}

impl MemberStatus {
    /// Map a Bot API status string onto our enum.
    pub fn from_api(status: &str) -> Self {
        match status {
            "creator" => MemberStatus::Creator,
            "administrator" => MemberStatus::Administrator,
            "member" => MemberStatus::Member,
            "restricted" => MemberStatus::Restricted,
            "left" => MemberStatus::Left,
            "kicked" => MemberStatus::Kicked,
            _ => MemberStatus::Other,
        }
    }

    /// Creators and administrators are exempt from moderation.
    pub fn is_privileged(&self) -> bool {
        matches!(self, MemberStatus::Creator | MemberStatus::Administrator)
    }
}

/// How the platform should render outgoing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

// ============================================================================
// GATEWAY TRAIT (PORT)
// ============================================================================

/// Everything the moderation and relay engines are allowed to ask of the platform.
///
/// Every call is a suspension point. Implementations enforce their own timeouts.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Look up a user's membership status in a chat.
    async fn get_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, GatewayError>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
        -> Result<(), GatewayError>;

    /// Revoke a member's right to send messages until the given unix time.
    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until_epoch_secs: i64,
    ) -> Result<(), GatewayError>;

    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), GatewayError>;

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        reply_to: Option<MessageId>,
    ) -> Result<(), GatewayError>;

    /// Copy a message into another chat without the "forwarded from" header.
    async fn copy_message(
        &self,
        target_chat_id: ChatId,
        source_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError>;

    async fn pin_message(&self, chat_id: ChatId, message_id: MessageId)
        -> Result<(), GatewayError>;
}

// ============================================================================
// BEST-EFFORT OUTCOMES
// ============================================================================

/// Result of a best-effort platform action.
///
/// Gateway failures never propagate out of the coordinators. Instead each
/// action is turned into an outcome that gets logged here and collected into
/// the coordinator's report, so a failed mute is visible rather than lost.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Failed(String),
}

impl ActionOutcome {
    /// Turn a gateway result into an outcome, logging any failure.
    pub fn from_result<T>(action: &'static str, result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(_) => ActionOutcome::Applied,
            Err(err) => {
                warn!(action, error = %err, "Best-effort platform action failed");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admins_and_creators_are_privileged() {
        assert!(MemberStatus::from_api("creator").is_privileged());
        assert!(MemberStatus::from_api("administrator").is_privileged());
        assert!(!MemberStatus::from_api("member").is_privileged());
        assert!(!MemberStatus::from_api("restricted").is_privileged());
        assert!(!MemberStatus::from_api("kicked").is_privileged());
        assert_eq!(MemberStatus::from_api("owner"), MemberStatus::Other);
    }

    #[test]
    fn test_outcome_keeps_failure_reason() {
        let outcome = ActionOutcome::from_result::<()>(
            "ban_member",
            Err(GatewayError::Api("not enough rights".to_string())),
        );
        assert_eq!(
            outcome,
            ActionOutcome::Failed("Telegram API error: not enough rights".to_string())
        );
        assert!(!outcome.is_applied());
        assert!(ActionOutcome::from_result("pin_message", Ok(())).is_applied());
    }
}
