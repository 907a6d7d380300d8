// The infra module contains implementations of core traits.
// Each platform or runtime concern goes in its own submodule.

#[path = "telegram/mod.rs"]
pub mod telegram;

#[path = "timer/mod.rs"]
pub mod timer;
