use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;
use super::tiers::{self, Tier};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub company: String,
    pub total_referrals: u32,
    pub successful_referrals: u32,
    pub maintenance_credits: u32,
    pub tier: Tier,
    pub join_date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    pub company: String,
}

impl User {
    pub fn new(id: String, new_user: NewUser, join_date: DateTime<Utc>) -> Self {
        Self {
            id,
            email: new_user.email.trim().to_string(),
            name: new_user.name.trim().to_string(),
            company: new_user.company.trim().to_string(),
            total_referrals: 0,
            successful_referrals: 0,
            maintenance_credits: 0,
            tier: tiers::tier_of(0),
            join_date,
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }

    /// Counts one more converted referral and returns the credits it earned.
    ///
    /// Returns `None` and leaves the user untouched if a counter would overflow.
    pub fn record_conversion(&mut self) -> Option<u32> {
        let successful = self.successful_referrals.checked_add(1)?;
        let credits = tiers::marginal_credits(self.successful_referrals, successful);
        let balance = self.maintenance_credits.checked_add(credits)?;

        self.successful_referrals = successful;
        self.maintenance_credits = balance;
        self.tier = tiers::tier_of(successful);

        Some(credits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "user-1".to_string(),
            NewUser {
                email: " john@example.com ".to_string(),
                name: "John Smith".to_string(),
                company: "Tech Solutions Inc".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_new_user_starts_at_bronze() {
        let user = user();
        assert_eq!(user.email, "john@example.com");
        assert_eq!(user.tier, Tier::Bronze);
        assert_eq!(user.maintenance_credits, 0);
        assert!(user.has_email("JOHN@example.com"));
    }

    #[test]
    fn test_record_conversion_accumulates_credits() {
        let mut user = user();
        let earned: Vec<u32> = (0..4).map(|_| user.record_conversion().unwrap()).collect();

        assert_eq!(earned, vec![1, 1, 2, 3]);
        assert_eq!(user.successful_referrals, 4);
        assert_eq!(user.maintenance_credits, tiers::credits_for(4));
        assert_eq!(user.tier, Tier::Silver);
    }

    #[test]
    fn test_record_conversion_leaves_user_untouched_on_overflow() {
        let mut user = user();
        user.maintenance_credits = u32::MAX;

        assert_eq!(user.record_conversion(), None);
        assert_eq!(user.successful_referrals, 0);
        assert_eq!(user.maintenance_credits, u32::MAX);
        assert_eq!(user.tier, Tier::Bronze);
    }

    #[test]
    fn test_new_user_validation() {
        let invalid = NewUser {
            email: "not-an-email".to_string(),
            name: "  ".to_string(),
            company: String::new(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }
}
