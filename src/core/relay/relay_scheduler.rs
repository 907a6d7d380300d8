// Relay scheduler - the start/stop state machine around the repeating job.
//
// States: Stopped, Running(job). Start and stop are idempotent. Each tick
// moves at most one post from the queue to the target chat.

use super::content_queue::ContentQueue;
use super::relay_models::{RelayConfig, SchedulerState, TickOutcome};
use crate::core::gateway::{ActionOutcome, Gateway};
use crate::core::timer::{TickCallback, TickFuture, Timer};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, info, warn};

pub struct RelayScheduler {
    state: Mutex<SchedulerState>,
    /// Held for a whole tick so ticks never overlap, even across jobs.
    tick_serial: tokio::sync::Mutex<()>,
    queue: Arc<ContentQueue>,
    gateway: Arc<dyn Gateway>,
    timer: Arc<dyn Timer>,
    config: RelayConfig,
}

impl RelayScheduler {
    pub fn new(
        queue: Arc<ContentQueue>,
        gateway: Arc<dyn Gateway>,
        timer: Arc<dyn Timer>,
        config: RelayConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SchedulerState::default()),
            tick_serial: tokio::sync::Mutex::new(()),
            queue,
            gateway,
            timer,
            config,
        })
    }

    /// Schedule the relay job. Returns false if it was already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut state = self.lock_state();
        if state.enabled {
            debug!("Relay already running, ignoring start");
            return false;
        }

        state.generation += 1;
        let generation = state.generation;
        let scheduler: Weak<Self> = Arc::downgrade(self);
        let callback: TickCallback = Arc::new(move || -> TickFuture {
            let scheduler = scheduler.clone();
            Box::pin(async move {
                if let Some(scheduler) = scheduler.upgrade() {
                    let outcome = scheduler.tick(generation).await;
                    debug!(?outcome, "Relay tick finished");
                }
            })
        });

        // Scheduling happens under the state lock so two starts can't both
        // create a job.
        let handle = self.timer.schedule_repeating(
            callback,
            self.config.interval(),
            self.config.first_delay(),
        );
        state.enabled = true;
        state.job = Some(handle);

        info!(
            job = handle.id(),
            interval_secs = self.config.interval_secs,
            first_delay_secs = self.config.first_delay_secs,
            "Auto-posting STARTED"
        );
        true
    }

    /// Cancel the relay job. Returns false if it was not running.
    ///
    /// Once this returns no tick will relay anything: the flag is cleared
    /// before the job is cancelled, and every tick checks it first.
    pub fn stop(&self) -> bool {
        let job = {
            let mut state = self.lock_state();
            if !state.enabled && state.job.is_none() {
                debug!("Relay already stopped, ignoring stop");
                return false;
            }
            state.enabled = false;
            state.generation += 1;
            state.job.take()
        };

        if let Some(job) = job {
            self.timer.cancel(job);
        }
        info!("Auto-posting STOPPED");
        true
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().enabled
    }

    pub fn state(&self) -> SchedulerState {
        self.lock_state().clone()
    }

    /// One firing of the relay job started as `generation`.
    pub async fn tick(&self, generation: u64) -> TickOutcome {
        let _serial = self.tick_serial.lock().await;

        let (target, item) = {
            let state = self.lock_state();
            if !state.enabled {
                return TickOutcome::Disabled;
            }
            if state.generation != generation {
                return TickOutcome::Stale;
            }
            if self.queue.is_empty() {
                return TickOutcome::Empty;
            }
            let Some(target) = self.config.target_chat_id else {
                drop(state);
                warn!("Relay target chat is not configured, skipping tick");
                return TickOutcome::NoTarget;
            };
            match self.queue.dequeue_front() {
                Some(item) => (target, item),
                None => return TickOutcome::Empty,
            }
        };

        let outcome = ActionOutcome::from_result(
            "copy_message",
            self.gateway
                .copy_message(target, item.source_chat_id, item.message_id)
                .await,
        );
        if outcome.is_applied() {
            info!(
                message_id = item.message_id,
                target_chat_id = target,
                remaining = self.queue.len(),
                "Forwarded message"
            );
        }

        TickOutcome::Relayed {
            message_id: item.message_id,
            outcome,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
