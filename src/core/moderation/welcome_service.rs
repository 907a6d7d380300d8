// Greets people who join a moderated group with the house rules.

use super::moderation_models::Sender;
use crate::core::gateway::{ActionOutcome, ChatId, Gateway, MessageId, TextFormat};
use std::sync::Arc;

pub struct WelcomeService {
    gateway: Arc<dyn Gateway>,
    enabled: bool,
}

impl WelcomeService {
    pub fn new(gateway: Arc<dyn Gateway>, enabled: bool) -> Self {
        Self { gateway, enabled }
    }

    pub fn welcome_text(first_name: &str) -> String {
        format!("👋 Welcome {first_name}!\nNo spam • No links • Be respectful")
    }

    /// Reply to the join message once per new (human) member.
    pub async fn greet(
        &self,
        chat_id: ChatId,
        join_message_id: MessageId,
        members: &[Sender],
    ) -> Vec<ActionOutcome> {
        if !self.enabled {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for member in members.iter().filter(|m| !m.is_bot) {
            let text = Self::welcome_text(&member.first_name);
            outcomes.push(ActionOutcome::from_result(
                "send_message",
                self.gateway
                    .send_message(chat_id, &text, TextFormat::Plain, Some(join_message_id))
                    .await,
            ));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{GatewayCall, MockGateway};

    fn member(user_id: i64, name: &str, is_bot: bool) -> Sender {
        Sender {
            user_id,
            first_name: name.to_string(),
            is_bot,
        }
    }

    #[tokio::test]
    async fn test_greets_each_human_as_a_reply() {
        let gateway = Arc::new(MockGateway::new());
        let welcome = WelcomeService::new(gateway.clone(), true);

        let outcomes = welcome
            .greet(
                -1,
                77,
                &[member(1, "Ana", false), member(2, "helper_bot", true), member(3, "Bo", false)],
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Send {
                    chat_id: -1,
                    text: "👋 Welcome Ana!\nNo spam • No links • Be respectful".to_string(),
                    format: TextFormat::Plain,
                    reply_to: Some(77),
                },
                GatewayCall::Send {
                    chat_id: -1,
                    text: "👋 Welcome Bo!\nNo spam • No links • Be respectful".to_string(),
                    format: TextFormat::Plain,
                    reply_to: Some(77),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_greeter_stays_quiet() {
        let gateway = Arc::new(MockGateway::new());
        let welcome = WelcomeService::new(gateway.clone(), false);

        let outcomes = welcome.greet(-1, 77, &[member(1, "Ana", false)]).await;

        assert!(outcomes.is_empty());
        assert!(gateway.calls().is_empty());
    }
}
