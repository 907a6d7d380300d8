// Escalation ledger - warn, mute, then ban.
//
// Pure bookkeeping: the ledger decides what should happen and the moderation
// service is the one that talks to the platform.

use super::moderation_models::{EscalationAction, EscalationState};
use super::user_table::UserTable;
use crate::core::gateway::UserId;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub struct EscalationLedger {
    warnings: UserTable<EscalationState>,
    max_warnings: u32,
    mute_duration: Duration,
    ban_escalation: bool,
}

impl EscalationLedger {
    pub fn new(
        max_warnings: u32,
        mute_duration: Duration,
        ban_escalation: bool,
        warnings: UserTable<EscalationState>,
    ) -> Self {
        Self {
            warnings,
            max_warnings,
            mute_duration,
            ban_escalation,
        }
    }

    /// Count a violation and decide the punishment.
    ///
    /// Each violation raises the warning count by one and earns a mute. The
    /// one that would take it past `max_warnings` is a ban instead, and the
    /// count starts over at zero. With ban escalation off the count stays at
    /// `max_warnings` and every further violation is another mute.
    pub fn record_violation(&self, user_id: UserId, now: DateTime<Utc>) -> EscalationAction {
        let max_warnings = self.max_warnings;
        let ban_escalation = self.ban_escalation;

        let warning_number = self.warnings.with_entry(user_id, now, |state| {
            let next = state.warning_count.saturating_add(1);
            if next <= max_warnings {
                state.warning_count = next;
                Some(next)
            } else if ban_escalation {
                state.warning_count = 0;
                None
            } else {
                state.warning_count = max_warnings;
                Some(max_warnings)
            }
        });

        match warning_number {
            Some(warning_number) => EscalationAction::Mute {
                duration: self.mute_duration,
                warning_number,
                max_warnings,
            },
            None => EscalationAction::Ban,
        }
    }

    /// Current warning count for a user (0 if never warned).
    pub fn warning_count(&self, user_id: UserId) -> u32 {
        self.warnings
            .get(user_id)
            .map(|state| state.warning_count)
            .unwrap_or(0)
    }

    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.warnings.sweep(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn ledger(max_warnings: u32, ban_escalation: bool) -> EscalationLedger {
        EscalationLedger::new(
            max_warnings,
            Duration::from_secs(300),
            ban_escalation,
            UserTable::new(100, chrono::Duration::seconds(3_600)),
        )
    }

    fn mute(warning_number: u32, max_warnings: u32) -> EscalationAction {
        EscalationAction::Mute {
            duration: Duration::from_secs(300),
            warning_number,
            max_warnings,
        }
    }

    #[test]
    fn test_first_violation_is_a_mute_with_warning_one() {
        let ledger = ledger(2, true);
        assert_eq!(ledger.record_violation(7, at(0)), mute(1, 2));
        assert_eq!(ledger.warning_count(7), 1);
    }

    #[test]
    fn test_third_strike_bans_and_resets() {
        let ledger = ledger(2, true);

        assert_eq!(ledger.record_violation(7, at(0)), mute(1, 2));
        assert_eq!(ledger.record_violation(7, at(1)), mute(2, 2));
        assert_eq!(ledger.warning_count(7), 2);

        assert_eq!(ledger.record_violation(7, at(2)), EscalationAction::Ban);
        assert_eq!(ledger.warning_count(7), 0);

        // The cycle starts over after a ban.
        assert_eq!(ledger.record_violation(7, at(3)), mute(1, 2));
    }

    #[test]
    fn test_zero_max_warnings_bans_immediately() {
        let ledger = ledger(0, true);
        assert_eq!(ledger.record_violation(7, at(0)), EscalationAction::Ban);
        assert_eq!(ledger.warning_count(7), 0);
    }

    #[test]
    fn test_without_ban_escalation_count_saturates() {
        let ledger = ledger(2, false);

        ledger.record_violation(7, at(0));
        ledger.record_violation(7, at(1));
        for secs in 2..6 {
            assert_eq!(ledger.record_violation(7, at(secs)), mute(2, 2));
            assert_eq!(ledger.warning_count(7), 2);
        }
    }

    #[test]
    fn test_users_escalate_independently() {
        let ledger = ledger(2, true);
        ledger.record_violation(1, at(0));
        ledger.record_violation(1, at(1));

        assert_eq!(ledger.record_violation(2, at(2)), mute(1, 2));
        assert_eq!(ledger.warning_count(1), 2);
    }
}
