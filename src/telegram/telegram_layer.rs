// Telegram layer - update routing and the polling loop.

#[path = "dispatcher.rs"]
pub mod dispatcher;

pub use dispatcher::{run_polling, BotServices};
