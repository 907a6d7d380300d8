// Test doubles for the core ports.

use crate::core::gateway::{
    ChatId, Gateway, GatewayError, MemberStatus, MessageId, TextFormat, UserId,
};
use crate::core::timer::{JobHandle, TickCallback, Timer};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Mutex;
use std::time::Duration;

/// A platform call as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    GetMemberStatus { chat_id: ChatId, user_id: UserId },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Restrict {
        chat_id: ChatId,
        user_id: UserId,
        until: i64,
    },
    Ban { chat_id: ChatId, user_id: UserId },
    Send {
        chat_id: ChatId,
        text: String,
        format: TextFormat,
        reply_to: Option<MessageId>,
    },
    Copy {
        target: ChatId,
        source: ChatId,
        message_id: MessageId,
    },
    Pin {
        chat_id: ChatId,
        message_id: MessageId,
    },
}

/// Recording gateway with scripted member statuses and failures.
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<GatewayCall>>,
    statuses: DashMap<UserId, MemberStatus>,
    /// Method names that should fail, e.g. "delete_message"
    failing: DashSet<&'static str>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, user_id: UserId, status: MemberStatus) {
        self.statuses.insert(user_id, status);
    }

    pub fn fail(&self, method: &'static str) {
        self.failing.insert(method);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than membership lookups.
    pub fn actions(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, GatewayCall::GetMemberStatus { .. }))
            .collect()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn copied(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Copy { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, method: &'static str, call: GatewayCall) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(method) {
            Err(GatewayError::Api(format!("{method} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, GatewayError> {
        self.record(
            "get_member_status",
            GatewayCall::GetMemberStatus { chat_id, user_id },
        )?;
        Ok(self
            .statuses
            .get(&user_id)
            .map(|s| *s)
            .unwrap_or(MemberStatus::Member))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.record(
            "delete_message",
            GatewayCall::Delete {
                chat_id,
                message_id,
            },
        )
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until_epoch_secs: i64,
    ) -> Result<(), GatewayError> {
        self.record(
            "restrict_member",
            GatewayCall::Restrict {
                chat_id,
                user_id,
                until: until_epoch_secs,
            },
        )
    }

    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), GatewayError> {
        self.record("ban_member", GatewayCall::Ban { chat_id, user_id })
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        reply_to: Option<MessageId>,
    ) -> Result<(), GatewayError> {
        self.record(
            "send_message",
            GatewayCall::Send {
                chat_id,
                text: text.to_string(),
                format,
                reply_to,
            },
        )
    }

    async fn copy_message(
        &self,
        target_chat_id: ChatId,
        source_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.record(
            "copy_message",
            GatewayCall::Copy {
                target: target_chat_id,
                source: source_chat_id,
                message_id,
            },
        )
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), GatewayError> {
        self.record(
            "pin_message",
            GatewayCall::Pin {
                chat_id,
                message_id,
            },
        )
    }
}

/// A scheduled job as the manual timer holds it.
pub struct ManualJob {
    pub handle: JobHandle,
    pub interval: Duration,
    pub first_delay: Duration,
    callback: TickCallback,
}

/// Timer that never fires on its own; tests crank it with `fire_all`.
#[derive(Default)]
pub struct ManualTimer {
    next_id: Mutex<u64>,
    jobs: Mutex<Vec<ManualJob>>,
    /// Callbacks of cancelled jobs, kept so tests can simulate a late tick.
    cancelled: Mutex<Vec<TickCallback>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn schedule_of(&self, index: usize) -> Option<(Duration, Duration)> {
        self.jobs
            .lock()
            .unwrap()
            .get(index)
            .map(|job| (job.interval, job.first_delay))
    }

    /// Fire every active job once, in scheduling order.
    pub async fn fire_all(&self) {
        let callbacks: Vec<TickCallback> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .map(|job| job.callback.clone())
            .collect();
        for callback in callbacks {
            callback().await;
        }
    }

    /// Fire jobs that were already cancelled, as a timer with imperfect
    /// cancellation might.
    pub async fn fire_cancelled(&self) {
        let callbacks: Vec<TickCallback> = self.cancelled.lock().unwrap().clone();
        for callback in callbacks {
            callback().await;
        }
    }
}

impl Timer for ManualTimer {
    fn schedule_repeating(
        &self,
        callback: TickCallback,
        interval: Duration,
        first_delay: Duration,
    ) -> JobHandle {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let handle = JobHandle::new(*next_id);
        self.jobs.lock().unwrap().push(ManualJob {
            handle,
            interval,
            first_delay,
            callback,
        });
        handle
    }

    fn cancel(&self, handle: JobHandle) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(pos) = jobs.iter().position(|job| job.handle == handle) {
            let job = jobs.remove(pos);
            self.cancelled.lock().unwrap().push(job.callback);
        }
    }
}
