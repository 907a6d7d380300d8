// Timer port - repeating jobs for the relay scheduler.
//
// The core decides WHEN a job should exist; the infra layer decides how the
// job actually runs (tokio tasks in production, a hand-cranked timer in tests).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub type TickFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Work to run on each tick. Called once per firing; the returned future is
/// awaited to completion before the same job fires again.
pub type TickCallback = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Opaque handle to a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(u64);

impl JobHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Timer: Send + Sync {
    /// Run `callback` every `interval`, first after `first_delay`.
    ///
    /// Ticks of one job never overlap: a tick that is still running delays the
    /// next one instead of racing it.
    fn schedule_repeating(
        &self,
        callback: TickCallback,
        interval: Duration,
        first_delay: Duration,
    ) -> JobHandle;

    /// Stop a job. Unknown or already-cancelled handles are ignored.
    fn cancel(&self, handle: JobHandle);
}
