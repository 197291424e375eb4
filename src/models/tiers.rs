//! Referrer tiers and the maintenance-credit schedule.
//!
//! Both are pure functions of a referrer's successful referral count.

use serde::{Deserialize, Serialize};

pub const SILVER_THRESHOLD: u32 = 3;
pub const GOLD_THRESHOLD: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => None,
        }
    }

    /// Benefits unlocked at this tier, including those of the tiers below it.
    pub fn benefits(self) -> &'static [&'static str] {
        match self {
            Tier::Gold => &[
                "Exclusive consultation access",
                "Bonus maintenance months",
                "Early feature access",
                "Priority support",
                "Extended maintenance credits",
                "Basic maintenance credits",
                "Referral tracking",
            ],
            Tier::Silver => &[
                "Priority support",
                "Extended maintenance credits",
                "Basic maintenance credits",
                "Referral tracking",
            ],
            Tier::Bronze => &["Basic maintenance credits", "Referral tracking"],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub current: Tier,
    pub next: Option<Tier>,
    /// Percentage through the current band, 0..=100.
    pub progress: f64,
}

pub fn tier_of(successful_referrals: u32) -> Tier {
    if successful_referrals >= GOLD_THRESHOLD {
        Tier::Gold
    } else if successful_referrals >= SILVER_THRESHOLD {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

pub fn tier_progress(successful_referrals: u32) -> TierProgress {
    let current = tier_of(successful_referrals);
    let band = f64::from(GOLD_THRESHOLD - SILVER_THRESHOLD);

    let progress = match current {
        Tier::Gold => 100.0,
        Tier::Silver => f64::from(successful_referrals - SILVER_THRESHOLD) / band * 100.0,
        Tier::Bronze => f64::from(successful_referrals) / f64::from(SILVER_THRESHOLD) * 100.0,
    };

    TierProgress {
        current,
        next: current.next(),
        progress,
    }
}

/// Total maintenance credits (months) owed for a number of successful referrals.
pub fn credits_for(successful_referrals: u32) -> u32 {
    match successful_referrals {
        0 => 0,
        1 => 1,
        2 => 2,
        3 => 4,
        n => 4u32.saturating_add((n - 3).saturating_mul(3)),
    }
}

/// Credits earned by moving from `previous` to `current` successful referrals.
pub fn marginal_credits(previous: u32, current: u32) -> u32 {
    credits_for(current).saturating_sub(credits_for(previous))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_schedule() {
        let expected = [0, 1, 2, 4, 7, 10, 13, 16];
        for (n, credits) in expected.iter().enumerate() {
            assert_eq!(credits_for(n as u32), *credits, "credits for {} referrals", n);
        }
    }

    #[test]
    fn test_credit_schedule_is_non_decreasing() {
        for n in 1..200 {
            let delta = credits_for(n) - credits_for(n - 1);
            assert!((1..=3).contains(&delta), "unexpected delta {} at {}", delta, n);
        }
    }

    #[test]
    fn test_tier_thresholds() {
        for n in 0..3 {
            assert_eq!(tier_of(n), Tier::Bronze);
        }
        for n in 3..6 {
            assert_eq!(tier_of(n), Tier::Silver);
        }
        for n in [6, 7, 50] {
            assert_eq!(tier_of(n), Tier::Gold);
        }
    }

    #[test]
    fn test_tier_progress_within_band() {
        let bronze = tier_progress(2);
        assert_eq!(bronze.current, Tier::Bronze);
        assert_eq!(bronze.next, Some(Tier::Silver));
        assert!((bronze.progress - 66.666).abs() < 0.01);

        let silver = tier_progress(4);
        assert_eq!(silver.current, Tier::Silver);
        assert_eq!(silver.next, Some(Tier::Gold));
        assert!((silver.progress - 33.333).abs() < 0.01);

        let gold = tier_progress(9);
        assert_eq!(gold.next, None);
        assert_eq!(gold.progress, 100.0);
    }

    #[test]
    fn test_tier_progress_at_band_edges() {
        assert_eq!(
            tier_progress(0),
            TierProgress {
                current: Tier::Bronze,
                next: Some(Tier::Silver),
                progress: 0.0
            }
        );
        assert_eq!(
            tier_progress(3),
            TierProgress {
                current: Tier::Silver,
                next: Some(Tier::Gold),
                progress: 0.0
            }
        );
        assert_eq!(
            tier_progress(6),
            TierProgress {
                current: Tier::Gold,
                next: None,
                progress: 100.0
            }
        );
        assert_eq!(tier_progress(u32::MAX).progress, 100.0);
    }

    #[test]
    fn test_third_conversion_reaches_silver() {
        assert_eq!(marginal_credits(2, 3), 2);
        assert_eq!(tier_of(3), Tier::Silver);
    }

    #[test]
    fn test_benefits_are_cumulative() {
        for benefit in Tier::Silver.benefits() {
            assert!(Tier::Gold.benefits().contains(benefit));
        }
        for benefit in Tier::Bronze.benefits() {
            assert!(Tier::Silver.benefits().contains(benefit));
        }
    }
}
