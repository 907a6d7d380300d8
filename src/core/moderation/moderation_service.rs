// Moderation service - the per-message decision pipeline.
//
// For every group message:
// 1. Admins and creators are exempt (their message may get pinned)
// 2. Bot commands are deleted silently
// 3. Help/urgent keywords point the sender at the admin contact
// 4. Links are a violation
// 5. Otherwise the message-rate check runs
//
// Violations go through the escalation ledger and end in a mute or a ban.
// Platform actions are best-effort: failures are logged and recorded in the
// report, never returned as errors.

use super::admin_gate::AdminGate;
use super::escalation_ledger::EscalationLedger;
use super::moderation_models::{
    EscalationAction, GroupMessage, ModerationConfig, ModerationReport, ModerationVerdict,
    UserActivity, Violation,
};
use super::spam_detector::SpamDetector;
use super::user_table::UserTable;
use super::violation_classifier::ViolationClassifier;
use crate::core::gateway::{ActionOutcome, Gateway, TextFormat};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ModerationService {
    gateway: Arc<dyn Gateway>,
    admin_gate: AdminGate,
    classifier: ViolationClassifier,
    spam: SpamDetector,
    ledger: EscalationLedger,
    config: ModerationConfig,
}

impl ModerationService {
    /// Build the pipeline with the default link markers and keywords.
    pub fn new(gateway: Arc<dyn Gateway>, config: ModerationConfig) -> Self {
        Self::with_classifier(gateway, config, ViolationClassifier::default())
    }

    pub fn with_classifier(
        gateway: Arc<dyn Gateway>,
        config: ModerationConfig,
        classifier: ViolationClassifier,
    ) -> Self {
        let spam = SpamDetector::new(
            config.spam_window(),
            config.spam_message_limit,
            UserTable::<UserActivity>::new(config.tracked_users_cap, config.tracked_user_ttl()),
        );
        let ledger = EscalationLedger::new(
            config.max_warnings,
            config.mute_duration(),
            config.policy.ban_escalation,
            UserTable::new(config.tracked_users_cap, config.tracked_user_ttl()),
        );

        Self {
            admin_gate: AdminGate::new(Arc::clone(&gateway)),
            gateway,
            classifier,
            spam,
            ledger,
            config,
        }
    }

    /// Run one group message through the pipeline.
    pub async fn handle_message(&self, msg: &GroupMessage, now: DateTime<Utc>) -> ModerationReport {
        let text = match msg.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => return ModerationReport::new(ModerationVerdict::Ignored),
        };

        if self
            .admin_gate
            .is_exempt(msg.chat_id, msg.sender.user_id)
            .await
        {
            let mut report = ModerationReport::new(ModerationVerdict::Exempt);
            if self.config.policy.pin_admin_messages {
                let outcome = ActionOutcome::from_result(
                    "pin_message",
                    self.gateway.pin_message(msg.chat_id, msg.message_id).await,
                );
                report.record("pin_message", outcome);
            }
            return report;
        }

        if ViolationClassifier::is_command(text) {
            let mut report = ModerationReport::new(ModerationVerdict::CommandRemoved);
            let outcome = ActionOutcome::from_result(
                "delete_message",
                self.gateway.delete_message(msg.chat_id, msg.message_id).await,
            );
            report.record("delete_message", outcome);
            return report;
        }

        let scan = self.classifier.scan(text);
        let mut report = ModerationReport::new(ModerationVerdict::Clean);

        if scan.has_urgent_keyword {
            self.alert_admin_contact(msg, &mut report).await;
        }

        let violation = if scan.has_link {
            Some(Violation::LinkSharing)
        } else if self.config.policy.spam_detection
            && self.spam.record_and_check(msg.sender.user_id, now)
        {
            self.spam.clear(msg.sender.user_id);
            Some(Violation::Spamming)
        } else {
            None
        };

        if let Some(violation) = violation {
            self.punish(msg, violation, now, &mut report).await;
        }

        report
    }

    /// Point the sender at the admin contact. Does not stop the pipeline.
    async fn alert_admin_contact(&self, msg: &GroupMessage, report: &mut ModerationReport) {
        let Some(admin_id) = self.config.admin_contact else {
            debug!(chat_id = msg.chat_id, "Urgent keyword seen but no admin contact configured");
            return;
        };

        let notice = format!(
            "🆘 {}, please DM admin: <a href='tg://user?id={}'>Admin</a>",
            msg.sender.first_name, admin_id
        );
        let outcome = ActionOutcome::from_result(
            "send_message",
            self.gateway
                .send_message(msg.chat_id, &notice, TextFormat::Html, None)
                .await,
        );
        report.alerted = outcome.is_applied();
        report.record("send_message", outcome);
    }

    /// Escalate, remove the offending message and apply the punishment.
    async fn punish(
        &self,
        msg: &GroupMessage,
        violation: Violation,
        now: DateTime<Utc>,
        report: &mut ModerationReport,
    ) {
        let user_id = msg.sender.user_id;
        let action = self.ledger.record_violation(user_id, now);

        info!(
            chat_id = msg.chat_id,
            user_id,
            violation = %violation,
            action = ?action,
            "Moderation violation"
        );

        let outcome = ActionOutcome::from_result(
            "delete_message",
            self.gateway.delete_message(msg.chat_id, msg.message_id).await,
        );
        report.record("delete_message", outcome);

        let notice = match &action {
            EscalationAction::Mute {
                duration,
                warning_number,
                max_warnings,
            } => {
                let until = i64::try_from(duration.as_secs())
                    .ok()
                    .and_then(|secs| now.timestamp().checked_add(secs))
                    .unwrap_or(i64::MAX);
                let outcome = ActionOutcome::from_result(
                    "restrict_member",
                    self.gateway
                        .restrict_member(msg.chat_id, user_id, until)
                        .await,
                );
                let applied = outcome.is_applied();
                report.record("restrict_member", outcome);
                applied.then(|| {
                    format!(
                        "⚠️ {} muted for {}. Warning {}/{}",
                        msg.sender.first_name, violation, warning_number, max_warnings
                    )
                })
            }
            EscalationAction::Ban => {
                let outcome = ActionOutcome::from_result(
                    "ban_member",
                    self.gateway.ban_member(msg.chat_id, user_id).await,
                );
                let applied = outcome.is_applied();
                report.record("ban_member", outcome);
                applied.then(|| {
                    format!(
                        "🚫 {} banned for repeated violations.",
                        msg.sender.first_name
                    )
                })
            }
        };

        // Only announce punishments that actually landed.
        if let Some(notice) = notice {
            let outcome = ActionOutcome::from_result(
                "send_message",
                self.gateway
                    .send_message(msg.chat_id, &notice, TextFormat::Plain, None)
                    .await,
            );
            report.record("send_message", outcome);
        }

        report.verdict = ModerationVerdict::Punished { violation, action };
    }

    /// Forget users who have been quiet for longer than the tracking TTL.
    pub fn sweep_idle_users(&self, now: DateTime<Utc>) -> usize {
        self.spam.sweep(now) + self.ledger.sweep(now)
    }

    #[allow(dead_code)]
    pub fn warning_count(&self, user_id: i64) -> u32 {
        self.ledger.warning_count(user_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
