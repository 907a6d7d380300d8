pub mod telegram_client;
pub mod telegram_types;

pub use telegram_client::TelegramClient;
