//! Usage counters and free-tier quotas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

use super::MembershipPlan;

/// A named usage counter on the membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    /// Downloads in the current usage period. Resets monthly.
    Downloads,
    /// Bundles created over the account's lifetime.
    Bundles,
}

impl UsageCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageCounter::Downloads => "downloads",
            UsageCounter::Bundles => "bundles",
        }
    }

    /// Whether the counter is cleared when a new usage period starts.
    pub fn resets_each_period(&self) -> bool {
        matches!(self, UsageCounter::Downloads)
    }
}

impl fmt::Display for UsageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageCounter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloads" => Ok(UsageCounter::Downloads),
            "bundles" => Ok(UsageCounter::Bundles),
            other => Err(ValidationError::invalid_format(
                "counter",
                format!("unknown usage counter '{}'", other),
            )),
        }
    }
}

/// Fixed quotas for members on the free plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTierLimits {
    pub downloads_per_period: u32,
    pub bundles: u32,
}

impl FreeTierLimits {
    pub fn cap_for(&self, counter: UsageCounter) -> u32 {
        match counter {
            UsageCounter::Downloads => self.downloads_per_period,
            UsageCounter::Bundles => self.bundles,
        }
    }

    /// Cap that applies to a plan. `None` means unlimited.
    pub fn cap_for_plan(&self, plan: MembershipPlan, counter: UsageCounter) -> Option<u32> {
        match plan {
            MembershipPlan::Free => Some(self.cap_for(counter)),
            MembershipPlan::CreatorPro => None,
        }
    }
}

impl Default for FreeTierLimits {
    fn default() -> Self {
        Self {
            downloads_per_period: 5,
            bundles: 3,
        }
    }
}

/// Counter values stored on the membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub downloads_this_period: u32,
    pub bundles_created: u32,
    /// Start of the period `downloads_this_period` counts.
    pub period_start: Timestamp,
}

impl UsageCounters {
    pub fn empty(period_start: Timestamp) -> Self {
        Self {
            downloads_this_period: 0,
            bundles_created: 0,
            period_start,
        }
    }

    pub fn value(&self, counter: UsageCounter) -> u32 {
        match counter {
            UsageCounter::Downloads => self.downloads_this_period,
            UsageCounter::Bundles => self.bundles_created,
        }
    }

    fn value_mut(&mut self, counter: UsageCounter) -> &mut u32 {
        match counter {
            UsageCounter::Downloads => &mut self.downloads_this_period,
            UsageCounter::Bundles => &mut self.bundles_created,
        }
    }

    /// Starts a new period if `period_start` is later than the stored one.
    pub fn roll_period(&mut self, period_start: Timestamp) {
        if self.period_start.is_before(&period_start) {
            self.downloads_this_period = 0;
            self.period_start = period_start;
        }
    }

    /// Adds `amount` without a cap.
    pub fn increment(&mut self, counter: UsageCounter, amount: u32, period_start: Timestamp) -> u32 {
        self.roll_period(period_start);
        let value = self.value_mut(counter);
        *value = value.saturating_add(amount);
        *value
    }

    /// Adds `amount` only if the result stays within `cap`.
    ///
    /// This is the in-process mirror of the conditional SQL update used by
    /// the Postgres store. Callers must hold exclusive access to the record.
    pub fn try_consume(
        &mut self,
        counter: UsageCounter,
        amount: u32,
        cap: Option<u32>,
        period_start: Timestamp,
    ) -> bool {
        self.roll_period(period_start);
        let value = self.value_mut(counter);
        let next = value.saturating_add(amount);
        match cap {
            Some(cap) if next > cap => false,
            _ => {
                *value = next;
                true
            }
        }
    }
}

/// Counter state right after an atomic consume attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Plan at the time of the update. Decides whether a cap applied.
    pub plan: MembershipPlan,
    /// Counter value after the attempt.
    pub value: u32,
    /// Whether the increment was applied.
    pub consumed: bool,
}

/// How much of a quota is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Limited(u32),
    Unlimited,
}

impl Remaining {
    pub fn as_option(&self) -> Option<u32> {
        match self {
            Remaining::Limited(n) => Some(*n),
            Remaining::Unlimited => None,
        }
    }
}

/// Result of a check-and-consume call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub allowed: bool,
    pub remaining: Remaining,
}

impl ConsumeOutcome {
    /// Derives the caller-facing outcome from a store snapshot.
    pub fn from_snapshot(
        snapshot: &UsageSnapshot,
        counter: UsageCounter,
        limits: &FreeTierLimits,
    ) -> Self {
        match limits.cap_for_plan(snapshot.plan, counter) {
            None => Self {
                allowed: snapshot.consumed,
                remaining: Remaining::Unlimited,
            },
            Some(cap) => Self {
                allowed: snapshot.consumed,
                remaining: Remaining::Limited(cap.saturating_sub(snapshot.value)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn period() -> Timestamp {
        Timestamp::from_unix_secs(1_704_067_200).unwrap() // 2024-01-01
    }

    #[test]
    fn counter_parses_names() {
        assert_eq!("downloads".parse::<UsageCounter>().unwrap(), UsageCounter::Downloads);
        assert_eq!("bundles".parse::<UsageCounter>().unwrap(), UsageCounter::Bundles);
        assert!("uploads".parse::<UsageCounter>().is_err());
    }

    #[test]
    fn free_plan_is_capped_and_creator_pro_is_not() {
        let limits = FreeTierLimits::default();
        assert_eq!(
            limits.cap_for_plan(MembershipPlan::Free, UsageCounter::Downloads),
            Some(5)
        );
        assert_eq!(
            limits.cap_for_plan(MembershipPlan::CreatorPro, UsageCounter::Downloads),
            None
        );
    }

    #[test]
    fn try_consume_stops_at_cap() {
        let mut usage = UsageCounters::empty(period());
        for _ in 0..5 {
            assert!(usage.try_consume(UsageCounter::Downloads, 1, Some(5), period()));
        }
        assert!(!usage.try_consume(UsageCounter::Downloads, 1, Some(5), period()));
        assert_eq!(usage.downloads_this_period, 5);
    }

    #[test]
    fn new_period_resets_downloads_but_not_bundles() {
        let mut usage = UsageCounters::empty(period());
        usage.try_consume(UsageCounter::Downloads, 5, Some(5), period());
        usage.try_consume(UsageCounter::Bundles, 2, Some(3), period());

        let next = period().plus_secs(31 * 24 * 3600).start_of_month();
        assert!(usage.try_consume(UsageCounter::Downloads, 1, Some(5), next));
        assert_eq!(usage.downloads_this_period, 1);
        assert_eq!(usage.bundles_created, 2);
        assert_eq!(usage.period_start, next);
    }

    #[test]
    fn older_period_start_does_not_roll_back() {
        let mut usage = UsageCounters::empty(period());
        usage.increment(UsageCounter::Downloads, 2, period());
        usage.roll_period(period().minus_days(40));
        assert_eq!(usage.downloads_this_period, 2);
        assert_eq!(usage.period_start, period());
    }

    #[test]
    fn outcome_reports_remaining_for_free_plan() {
        let snapshot = UsageSnapshot {
            plan: MembershipPlan::Free,
            value: 3,
            consumed: true,
        };
        let outcome =
            ConsumeOutcome::from_snapshot(&snapshot, UsageCounter::Downloads, &FreeTierLimits::default());
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, Remaining::Limited(2));
    }

    #[test]
    fn outcome_is_unlimited_for_creator_pro() {
        let snapshot = UsageSnapshot {
            plan: MembershipPlan::CreatorPro,
            value: 400,
            consumed: true,
        };
        let outcome =
            ConsumeOutcome::from_snapshot(&snapshot, UsageCounter::Downloads, &FreeTierLimits::default());
        assert_eq!(outcome.remaining, Remaining::Unlimited);
        assert_eq!(outcome.remaining.as_option(), None);
    }

    #[test]
    fn outcome_remaining_saturates_when_over_cap() {
        // A member downgraded from creator_pro may already be past the cap.
        let snapshot = UsageSnapshot {
            plan: MembershipPlan::Free,
            value: 40,
            consumed: false,
        };
        let outcome =
            ConsumeOutcome::from_snapshot(&snapshot, UsageCounter::Downloads, &FreeTierLimits::default());
        assert!(!outcome.allowed);
        assert_eq!(outcome.remaining, Remaining::Limited(0));
    }

    proptest! {
        #[test]
        fn capped_counter_never_exceeds_cap(cap in 0u32..50, amounts in prop::collection::vec(1u32..4, 0..100)) {
            let mut usage = UsageCounters::empty(period());
            for amount in amounts {
                usage.try_consume(UsageCounter::Downloads, amount, Some(cap), period());
                prop_assert!(usage.downloads_this_period <= cap);
            }
        }
    }
}
