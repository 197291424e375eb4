use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// Maintenance credits stay redeemable for this many calendar months.
pub const CREDIT_VALIDITY_MONTHS: u32 = 24;

/// Unredeemed credits within this many days of expiry are flagged to the referrer.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralReward {
    pub id: String,
    pub user_id: String,
    pub referral_id: String,
    pub credits_earned: u32,
    pub date_earned: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub is_redeemed: bool,
    pub date_redeemed: Option<DateTime<Utc>>,
}

/// A manually granted reward.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    pub user_id: String,
    pub referral_id: String,
    pub credits_earned: u32,
    pub date_earned: Option<DateTime<Utc>>,
}

pub fn expiration_for(date_earned: DateTime<Utc>) -> DateTime<Utc> {
    date_earned
        .checked_add_months(Months::new(CREDIT_VALIDITY_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl ReferralReward {
    pub fn earned(
        id: String,
        user_id: String,
        referral_id: String,
        credits_earned: u32,
        date_earned: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            referral_id,
            credits_earned,
            date_earned,
            expiration_date: expiration_for(date_earned),
            is_redeemed: false,
            date_redeemed: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date <= now
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.is_redeemed && !self.is_expired(now)
    }

    /// Days left before expiry, rounded up. Zero or negative once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        let remaining = (self.expiration_date - now).num_milliseconds();
        let days = remaining.div_euclid(MILLIS_PER_DAY);

        if remaining.rem_euclid(MILLIS_PER_DAY) > 0 {
            days + 1
        } else {
            days
        }
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        !self.is_redeemed && (1..=EXPIRY_WARNING_DAYS).contains(&self.days_until_expiry(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_expiration_is_two_calendar_years() {
        let earned = Utc.with_ymd_and_hms(2024, 2, 1, 14, 30, 0).unwrap();
        let reward = ReferralReward::earned(
            "reward-1".to_string(),
            "user-1".to_string(),
            "ref-1".to_string(),
            1,
            earned,
        );

        assert_eq!(
            reward.expiration_date,
            Utc.with_ymd_and_hms(2026, 2, 1, 14, 30, 0).unwrap()
        );
        assert!(reward.is_available(earned));
        assert!(reward.is_expired(reward.expiration_date));
    }

    #[test]
    fn test_days_until_expiry_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut reward = ReferralReward::earned(
            "reward-1".to_string(),
            "user-1".to_string(),
            "ref-1".to_string(),
            1,
            now,
        );

        reward.expiration_date = now + Duration::days(30);
        assert_eq!(reward.days_until_expiry(now), 30);
        assert!(reward.is_expiring_soon(now));

        reward.expiration_date = now + Duration::days(30) + Duration::milliseconds(1);
        assert_eq!(reward.days_until_expiry(now), 31);
        assert!(!reward.is_expiring_soon(now));

        reward.expiration_date = now + Duration::hours(1);
        assert_eq!(reward.days_until_expiry(now), 1);
        assert!(reward.is_expiring_soon(now));

        reward.expiration_date = now;
        assert_eq!(reward.days_until_expiry(now), 0);
        assert!(!reward.is_expiring_soon(now));

        reward.expiration_date = now - Duration::hours(36);
        assert_eq!(reward.days_until_expiry(now), -1);

        reward.expiration_date = now + Duration::days(3);
        reward.is_redeemed = true;
        assert!(!reward.is_expiring_soon(now));
    }
}
