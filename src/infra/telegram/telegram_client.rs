// Telegram Bot API client - implements the core Gateway port over HTTPS.
//
// Every call is a JSON POST to https://api.telegram.org/bot<token>/<method>
// and every reply comes back in the {ok, result, description} envelope.

use super::telegram_types::{ChatMember, MessageIdResponse, TelegramResponse, Update};
use crate::core::gateway::{
    ChatId, Gateway, GatewayError, MemberStatus, MessageId, TextFormat, UserId,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";
/// Timeout for ordinary API calls (seconds)
const API_TIMEOUT_SECS: u64 = 30;

pub struct TelegramClient {
    client: Client,
    token: String,
    /// Long-polling timeout handed to getUpdates (seconds)
    poll_timeout_secs: u64,
    /// Highest update id handled so far
    last_update_id: AtomicI64,
}

impl TelegramClient {
    /// Build a client for `token`. A blank token is rejected up front.
    pub fn new(token: impl Into<String>, poll_timeout_secs: u64) -> Result<Self, GatewayError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GatewayError::NotConfigured("Telegram bot token is empty".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            token,
            poll_timeout_secs,
            last_update_id: AtomicI64::new(0),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", TELEGRAM_API_BASE, self.token, method)
    }

    /// Call a Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&params)
            .timeout(timeout)
            .send()
            .await
            // Without the URL: it carries the bot token.
            .map_err(|e| GatewayError::Http(e.without_url().to_string()))?;

        let body: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.without_url().to_string()))?;

        unwrap_envelope(method, body)
    }

    async fn call_default<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, GatewayError> {
        self.call(method, params, Duration::from_secs(API_TIMEOUT_SECS))
            .await
    }

    /// Fetch the next batch of updates, long-polling until one arrives or the
    /// poll timeout passes. Advances the offset past everything returned.
    pub async fn get_updates(&self) -> Result<Vec<Update>, GatewayError> {
        let offset = self.last_update_id.load(Ordering::SeqCst);
        let params = json!({
            "offset": if offset > 0 { offset + 1 } else { 0 },
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "channel_post"],
        });

        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                params,
                Duration::from_secs(self.poll_timeout_secs + 10),
            )
            .await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.last_update_id.store(last, Ordering::SeqCst);
        }

        Ok(updates)
    }
}

fn unwrap_envelope<T>(method: &str, body: TelegramResponse<T>) -> Result<T, GatewayError> {
    if !body.ok {
        return Err(GatewayError::Api(format!(
            "{}: {}",
            method,
            body.description.unwrap_or_default()
        )));
    }
    body.result
        .ok_or_else(|| GatewayError::Decode(format!("{method}: ok but no result")))
}

/// Take away the right to send messages until `until_epoch_secs`.
fn restrict_params(chat_id: ChatId, user_id: UserId, until_epoch_secs: i64) -> Value {
    json!({
        "chat_id": chat_id,
        "user_id": user_id,
        "permissions": { "can_send_messages": false },
        "until_date": until_epoch_secs,
    })
}

fn send_params(
    chat_id: ChatId,
    text: &str,
    format: TextFormat,
    reply_to: Option<MessageId>,
) -> Value {
    let mut params = json!({ "chat_id": chat_id, "text": text });
    if format == TextFormat::Html {
        params["parse_mode"] = Value::String("HTML".to_string());
    }
    if let Some(reply_to) = reply_to {
        params["reply_to_message_id"] = Value::Number(reply_to.into());
    }
    params
}

fn copy_params(target_chat_id: ChatId, source_chat_id: ChatId, message_id: MessageId) -> Value {
    json!({
        "chat_id": target_chat_id,
        "from_chat_id": source_chat_id,
        "message_id": message_id,
    })
}

fn member_status(member: ChatMember) -> MemberStatus {
    MemberStatus::from_api(&member.status)
}

#[async_trait]
impl Gateway for TelegramClient {
    async fn get_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, GatewayError> {
        let member: ChatMember = self
            .call_default(
                "getChatMember",
                json!({ "chat_id": chat_id, "user_id": user_id }),
            )
            .await?;
        Ok(member_status(member))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.call_default::<bool>(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until_epoch_secs: i64,
    ) -> Result<(), GatewayError> {
        self.call_default::<bool>(
            "restrictChatMember",
            restrict_params(chat_id, user_id, until_epoch_secs),
        )
        .await?;
        Ok(())
    }

    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), GatewayError> {
        self.call_default::<bool>(
            "banChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        reply_to: Option<MessageId>,
    ) -> Result<(), GatewayError> {
        self.call_default::<Value>(
            "sendMessage",
            send_params(chat_id, text, format, reply_to),
        )
        .await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        target_chat_id: ChatId,
        source_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.call_default::<MessageIdResponse>(
            "copyMessage",
            copy_params(target_chat_id, source_chat_id, message_id),
        )
        .await?;
        Ok(())
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.call_default::<bool>(
            "pinChatMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_embeds_token_and_method() {
        let client = TelegramClient::new("123:abc", 30).unwrap();
        assert_eq!(
            client.api_url("getChatMember"),
            "https://api.telegram.org/bot123:abc/getChatMember"
        );
    }

    #[test]
    fn test_blank_token_is_not_configured() {
        assert!(matches!(
            TelegramClient::new("  ", 30),
            Err(GatewayError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_envelope_errors_carry_method_and_description() {
        let body: TelegramResponse<bool> = serde_json::from_str(
            r#"{"ok": false, "description": "Bad Request: not enough rights"}"#,
        )
        .unwrap();

        match unwrap_envelope("banChatMember", body) {
            Err(GatewayError::Api(reason)) => {
                assert_eq!(reason, "banChatMember: Bad Request: not enough rights")
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_without_result_is_a_decode_error() {
        let body: TelegramResponse<bool> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(matches!(
            unwrap_envelope("deleteMessage", body),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_member_status_mapping() {
        let admin: ChatMember =
            serde_json::from_str(r#"{"status": "administrator", "user": {"id": 1}}"#).unwrap();
        let member: ChatMember = serde_json::from_str(r#"{"status": "member"}"#).unwrap();

        assert_eq!(member_status(admin), MemberStatus::Administrator);
        assert_eq!(member_status(member), MemberStatus::Member);
    }

    #[test]
    fn test_restrict_params_mute_until() {
        assert_eq!(
            restrict_params(-100, 42, 1_700_000_300),
            json!({
                "chat_id": -100,
                "user_id": 42,
                "permissions": { "can_send_messages": false },
                "until_date": 1_700_000_300,
            })
        );
    }

    #[test]
    fn test_send_params_format_and_reply() {
        assert_eq!(
            send_params(-100, "hi", TextFormat::Plain, None),
            json!({ "chat_id": -100, "text": "hi" })
        );
        assert_eq!(
            send_params(-100, "<b>hi</b>", TextFormat::Html, Some(7)),
            json!({
                "chat_id": -100,
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "reply_to_message_id": 7,
            })
        );
    }

    #[test]
    fn test_copy_params_map_target_and_source() {
        assert_eq!(
            copy_params(-777, -500, 100),
            json!({ "chat_id": -777, "from_chat_id": -500, "message_id": 100 })
        );
    }
}
