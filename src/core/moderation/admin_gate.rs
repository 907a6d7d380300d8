// Admin immunity check.

use crate::core::gateway::{ChatId, Gateway, UserId};
use std::sync::Arc;

/// Decides whether a user is exempt from moderation in a chat.
pub struct AdminGate {
    gateway: Arc<dyn Gateway>,
}

impl AdminGate {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// True iff the user is an administrator or the creator of the chat.
    ///
    /// Fails closed: if the lookup errors the user is moderated like anyone
    /// else for this message. A real admin may occasionally be restricted
    /// during a platform hiccup; letting spam through is worse.
    pub async fn is_exempt(&self, chat_id: ChatId, user_id: UserId) -> bool {
        match self.gateway.get_member_status(chat_id, user_id).await {
            Ok(status) => status.is_privileged(),
            Err(err) => {
                tracing::warn!(
                    chat_id,
                    user_id,
                    error = %err,
                    "Membership lookup failed, treating user as non-exempt"
                );
                false
            }
        }
    }
}
