// Bot API wire types - only the fields this bot reads.

use serde::Deserialize;

/// Every Bot API reply is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    #[serde(other)]
    Unknown,
}

impl ChatKind {
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatMember {
    pub status: String,
}

/// Reply to `copyMessage`.
#[derive(Debug, Deserialize)]
pub struct MessageIdResponse {
    #[allow(dead_code)]
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_group_message_update() {
        let raw = r#"{
            "ok": true,
            "result": [{
                "update_id": 501,
                "message": {
                    "message_id": 77,
                    "date": 1700000000,
                    "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
                    "chat": {"id": -100123, "type": "supergroup", "title": "Community"},
                    "text": "hello"
                }
            }]
        }"#;

        let body: TelegramResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(body.ok);
        let update = &body.result.unwrap()[0];
        let message = update.message.as_ref().unwrap();
        assert_eq!(update.update_id, 501);
        assert_eq!(message.chat.kind, ChatKind::Supergroup);
        assert_eq!(message.from.as_ref().unwrap().first_name, "Alice");
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert!(message.new_chat_members.is_empty());
        assert!(update.channel_post.is_none());
    }

    #[test]
    fn test_decode_channel_post_and_join_event() {
        let raw = r##"[
            {"update_id": 1, "channel_post": {
                "message_id": 5, "date": 0,
                "chat": {"id": -100999, "type": "channel", "title": "Source"},
                "text": "#start"
            }},
            {"update_id": 2, "message": {
                "message_id": 6, "date": 0,
                "from": {"id": 1, "is_bot": false, "first_name": "Ana"},
                "chat": {"id": -5, "type": "group"},
                "new_chat_members": [{"id": 2, "is_bot": true, "first_name": "Bot"}]
            }},
            {"update_id": 3, "message": {
                "message_id": 7, "date": 0,
                "chat": {"id": 8, "type": "sender"}
            }}
        ]"##;

        let updates: Vec<Update> = serde_json::from_str(raw).unwrap();
        let post = updates[0].channel_post.as_ref().unwrap();
        assert_eq!(post.chat.kind, ChatKind::Channel);
        assert!(post.from.is_none());

        let join = updates[1].message.as_ref().unwrap();
        assert!(join.text.is_none());
        assert!(join.new_chat_members[0].is_bot);

        assert_eq!(updates[2].message.as_ref().unwrap().chat.kind, ChatKind::Unknown);
    }

    #[test]
    fn test_decode_api_error_envelope() {
        let raw = r#"{"ok": false, "error_code": 400, "description": "Bad Request: message to delete not found"}"#;

        let body: TelegramResponse<bool> = serde_json::from_str(raw).unwrap();
        assert!(!body.ok);
        assert!(body.result.is_none());
        assert_eq!(
            body.description.as_deref(),
            Some("Bad Request: message to delete not found")
        );
    }
}
