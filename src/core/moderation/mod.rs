// Core moderation module - admin immunity, classification, spam detection
// and warn -> mute -> ban escalation.

pub mod admin_gate;
pub mod escalation_ledger;
pub mod moderation_models;
pub mod moderation_service;
pub mod spam_detector;
pub mod user_table;
pub mod violation_classifier;
pub mod welcome_service;

pub use moderation_models::*;
pub use moderation_service::*;
pub use welcome_service::WelcomeService;
