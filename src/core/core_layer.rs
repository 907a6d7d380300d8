// The core module contains all business logic.
// Each feature gets its own submodule; platform access goes through the
// gateway and timer ports.

#[path = "gateway.rs"]
pub mod gateway;

#[path = "timer.rs"]
pub mod timer;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "relay/mod.rs"]
pub mod relay;

#[cfg(test)]
#[path = "test_support.rs"]
pub mod test_support;
