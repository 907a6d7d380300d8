// Core relay module - buffers source-channel posts and copies them to the
// target chat on a timer.

pub mod content_queue;
pub mod relay_models;
pub mod relay_scheduler;
pub mod relay_service;

pub use content_queue::ContentQueue;
pub use relay_models::*;
pub use relay_scheduler::RelayScheduler;
pub use relay_service::RelayService;
