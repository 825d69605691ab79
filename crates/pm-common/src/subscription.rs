//! Subscription tier reconciliation. The transition rules are pure; the db
//! layer applies the outcome inside a single transaction together with the
//! user's credit balance.

use chrono::{DateTime, Duration, Utc};

pub const SUBSCRIPTION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
    Expert,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "FREE",
            Tier::Premium => "PREMIUM",
            Tier::Expert => "EXPERT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FREE" => Some(Tier::Free),
            "PREMIUM" => Some(Tier::Premium),
            "EXPERT" => Some(Tier::Expert),
            _ => None,
        }
    }

    /// Credits granted for one 30-day subscription window.
    pub fn credit_allotment(&self) -> i64 {
        match self {
            Tier::Free => 5_000,
            Tier::Premium => 50_000,
            Tier::Expert => 150_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionState {
    pub tier: Tier,
    pub credits: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Reconcile a requested tier against the existing subscription, evaluated
/// against `now`:
/// - no subscription, or the existing one has expired: fresh 30-day window
///   with the requested tier's allotment;
/// - active and same tier: the window extends 30 days past its CURRENT end
///   date and credits reset to the flat allotment;
/// - active and different tier: new 30-day window from now, credits are the
///   sum of both tiers' allotments, and the new tier becomes current.
pub fn reconcile(
    existing: Option<&SubscriptionState>,
    requested: Tier,
    now: DateTime<Utc>,
) -> SubscriptionState {
    let window = Duration::days(SUBSCRIPTION_WINDOW_DAYS);

    match existing {
        Some(current) if current.end_date > now => {
            if current.tier == requested {
                SubscriptionState {
                    tier: requested,
                    credits: requested.credit_allotment(),
                    start_date: current.start_date,
                    end_date: current.end_date + window,
                }
            } else {
                SubscriptionState {
                    tier: requested,
                    credits: current.tier.credit_allotment() + requested.credit_allotment(),
                    start_date: now,
                    end_date: now + window,
                }
            }
        }
        _ => SubscriptionState {
            tier: requested,
            credits: requested.credit_allotment(),
            start_date: now,
            end_date: now + window,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_purchase_opens_a_30_day_window() {
        let now = at(1);
        let state = reconcile(None, Tier::Premium, now);

        assert_eq!(state.tier, Tier::Premium);
        assert_eq!(state.credits, 50_000);
        assert_eq!(state.start_date, now);
        assert_eq!(state.end_date, now + Duration::days(30));
    }

    #[test]
    fn expired_subscription_restarts_from_now() {
        let expired = SubscriptionState {
            tier: Tier::Premium,
            credits: 10,
            start_date: at(1) - Duration::days(60),
            end_date: at(1) - Duration::days(30),
        };

        let state = reconcile(Some(&expired), Tier::Free, at(1));
        assert_eq!(state.tier, Tier::Free);
        assert_eq!(state.credits, 5_000);
        assert_eq!(state.start_date, at(1));
    }

    #[test]
    fn same_tier_renewal_extends_from_previous_end_date() {
        let current = SubscriptionState {
            tier: Tier::Premium,
            credits: 123,
            start_date: at(1),
            end_date: at(20),
        };

        let state = reconcile(Some(&current), Tier::Premium, at(5));
        // extends from the existing end date, not from "now"
        assert_eq!(state.end_date, at(20) + Duration::days(30));
        assert_eq!(state.start_date, at(1));
        // credits reset flat, never cumulative
        assert_eq!(state.credits, 50_000);
    }

    #[test]
    fn tier_change_sums_both_allotments() {
        let current = SubscriptionState {
            tier: Tier::Premium,
            credits: 42,
            start_date: at(1),
            end_date: at(25),
        };

        let now = at(10);
        let state = reconcile(Some(&current), Tier::Expert, now);
        assert_eq!(state.tier, Tier::Expert);
        assert_eq!(state.credits, 50_000 + 150_000);
        assert_eq!(state.start_date, now);
        assert_eq!(state.end_date, now + Duration::days(30));
    }

    #[test]
    fn tier_parses_storage_form() {
        assert_eq!(Tier::parse("PREMIUM"), Some(Tier::Premium));
        assert_eq!(Tier::parse("premium"), None);
        assert_eq!(Tier::Premium.as_str(), "PREMIUM");
    }
}
