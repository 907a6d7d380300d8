// This is the entry point of the Telegram moderation and relay bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Telegram Bot API, tokio timer)
// - `telegram/` = Telegram-specific update routing and polling
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the background sweeper
// 4. Poll Telegram until Ctrl-C

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "telegram/telegram_layer.rs"]
mod telegram;

mod config;

use crate::config::BotConfig;
use crate::core::gateway::Gateway;
use crate::core::moderation::{ModerationService, WelcomeService};
use crate::core::relay::{ContentQueue, RelayScheduler, RelayService};
use crate::core::timer::Timer;
use crate::infra::telegram::TelegramClient;
use crate::infra::timer::TokioTimer;
use crate::telegram::{run_polling, BotServices};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    if config.relay.target_chat_id.is_none() {
        tracing::warn!("TARGET_CHAT_ID not set - channel posts will queue but never relay");
    }
    if config.moderation.admin_contact.is_none() {
        tracing::info!("ADMIN_ID not set - help requests will not be answered");
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let client = Arc::new(
        TelegramClient::new(config.telegram_token.clone(), config.poll_timeout_secs)
            .context("Failed to create Telegram client")?,
    );
    let gateway: Arc<dyn Gateway> = client.clone();
    let timer: Arc<dyn Timer> = Arc::new(TokioTimer::new());

    let moderation = Arc::new(ModerationService::new(
        Arc::clone(&gateway),
        config.moderation.clone(),
    ));
    let welcome = Arc::new(WelcomeService::new(
        Arc::clone(&gateway),
        config.moderation.policy.welcome_new_members,
    ));

    let queue = Arc::new(ContentQueue::new());
    let scheduler = RelayScheduler::new(
        Arc::clone(&queue),
        Arc::clone(&gateway),
        timer,
        config.relay.clone(),
    );
    let relay = Arc::new(RelayService::new(scheduler, queue));

    let services = Arc::new(BotServices {
        moderation: Arc::clone(&moderation),
        relay: Arc::clone(&relay),
        welcome,
    });

    // Forget users who have gone quiet so per-user tracking stays bounded.
    let sweep_every = Duration::from_secs(config.moderation.tracked_user_ttl_secs.max(60));
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let dropped = moderation.sweep_idle_users(chrono::Utc::now());
            if dropped > 0 {
                tracing::info!(dropped, "Swept idle users from moderation tracking");
            }
        }
    });

    tracing::info!(
        spam_limit = config.moderation.spam_message_limit,
        spam_window_secs = config.moderation.spam_window_secs,
        max_warnings = config.moderation.max_warnings,
        "🚀 Bot is ready!"
    );

    tokio::select! {
        _ = run_polling(client, services) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Shutting down");
        }
    }

    relay.shutdown();
    sweeper.abort();
    Ok(())
}
