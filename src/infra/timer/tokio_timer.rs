// Tokio-backed implementation of the core Timer port.
//
// Each job is one spawned task looping over `interval_at`. The task awaits the
// tick callback before asking for the next tick, and missed ticks are delayed
// rather than bunched up, so a job never runs two ticks at once.

use crate::core::timer::{JobHandle, TickCallback, Timer};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Runs repeating jobs on the current tokio runtime.
///
/// Must be used from within a runtime: scheduling spawns a task.
pub struct TokioTimer {
    next_id: AtomicU64,
    jobs: DashMap<u64, JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: DashMap::new(),
        }
    }

    #[allow(dead_code)]
    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for TokioTimer {
    fn schedule_repeating(
        &self,
        callback: TickCallback,
        interval: Duration,
        first_delay: Duration,
    ) -> JobHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        // interval_at panics on a zero period.
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + first_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback().await;
            }
        });

        self.jobs.insert(id, task);
        tracing::debug!(job = id, ?interval, ?first_delay, "Scheduled repeating job");
        JobHandle::new(id)
    }

    fn cancel(&self, handle: JobHandle) {
        if let Some((_, task)) = self.jobs.remove(&handle.id()) {
            task.abort();
            tracing::debug!(job = handle.id(), "Cancelled repeating job");
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for job in self.jobs.iter() {
            job.value().abort();
        }
    }
}
