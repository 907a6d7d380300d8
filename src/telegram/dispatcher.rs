// Turns raw Telegram updates into core events and hands them to the services.
//
// Updates are handled one at a time, in the order getUpdates returns them.

use crate::core::moderation::{GroupMessage, ModerationService, Sender, WelcomeService};
use crate::core::relay::{ChannelPost, RelayService};
use crate::infra::telegram::telegram_types::{ChatKind, Message, Update, User};
use crate::infra::telegram::TelegramClient;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long to back off after a failed poll
const POLL_RETRY_SECS: u64 = 5;

/// Services shared by every update handler.
pub struct BotServices {
    pub moderation: Arc<ModerationService>,
    pub relay: Arc<RelayService>,
    pub welcome: Arc<WelcomeService>,
}

/// A platform update the core cares about.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Group(GroupMessage),
    MembersJoined {
        chat_id: i64,
        message_id: i64,
        members: Vec<Sender>,
    },
    Channel(ChannelPost),
}

fn sender(user: &User) -> Sender {
    Sender {
        user_id: user.id,
        first_name: user.first_name.clone(),
        is_bot: user.is_bot,
    }
}

fn route_group_message(message: Message) -> Option<InboundEvent> {
    if !message.new_chat_members.is_empty() {
        return Some(InboundEvent::MembersJoined {
            chat_id: message.chat.id,
            message_id: message.message_id,
            members: message.new_chat_members.iter().map(sender).collect(),
        });
    }

    // Skip bots (including ourselves and anonymous-admin posts)
    let author = message.from.as_ref().filter(|user| !user.is_bot)?;
    message.text.as_ref()?;

    Some(InboundEvent::Group(GroupMessage {
        chat_id: message.chat.id,
        message_id: message.message_id,
        sender: sender(author),
        text: message.text,
    }))
}

/// Work out what an update is, or `None` if we don't handle it.
pub fn route_update(update: Update) -> Option<InboundEvent> {
    if let Some(post) = update.channel_post {
        return Some(InboundEvent::Channel(ChannelPost {
            chat_id: post.chat.id,
            message_id: post.message_id,
            text: post.text,
        }));
    }

    let message = update.message?;
    if message.chat.kind.is_group() {
        route_group_message(message)
    } else if message.chat.kind == ChatKind::Channel {
        // Linked-channel messages can show up as plain messages too.
        Some(InboundEvent::Channel(ChannelPost {
            chat_id: message.chat.id,
            message_id: message.message_id,
            text: message.text,
        }))
    } else {
        None
    }
}

/// Hand one event to the service that owns it.
pub async fn dispatch(services: &BotServices, event: InboundEvent) {
    match event {
        InboundEvent::Group(message) => {
            let report = services.moderation.handle_message(&message, Utc::now()).await;
            debug!(
                chat_id = message.chat_id,
                message_id = message.message_id,
                verdict = ?report.verdict,
                failures = ?report.failures(),
                "Moderated group message"
            );
        }
        InboundEvent::MembersJoined {
            chat_id,
            message_id,
            members,
        } => {
            let outcomes = services.welcome.greet(chat_id, message_id, &members).await;
            debug!(chat_id, greeted = outcomes.len(), "Welcomed new members");
        }
        InboundEvent::Channel(post) => {
            let disposition = services.relay.handle_post(&post, Utc::now());
            debug!(chat_id = post.chat_id, ?disposition, "Handled channel post");
        }
    }
}

/// Long-poll Telegram forever, dispatching updates in arrival order.
///
/// Poll errors are logged and retried after a short back-off; they never end
/// the loop.
pub async fn run_polling(client: Arc<TelegramClient>, services: Arc<BotServices>) {
    info!("Starting Telegram polling");

    loop {
        match client.get_updates().await {
            Ok(updates) => {
                for update in updates {
                    let update_id = update.update_id;
                    match route_update(update) {
                        Some(event) => dispatch(&services, event).await,
                        None => debug!(update_id, "Ignoring update"),
                    }
                }
            }
            Err(e) => {
                error!("Telegram polling error: {}", e);
                tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
            }
        }
    }
}
