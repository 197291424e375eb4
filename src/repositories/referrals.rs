use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::referrals::{NewReferral, Referral, ReferralFilter, ReferralStatus};
use crate::models::rewards::{NewReward, ReferralReward};
use crate::models::users::{NewUser, User};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Cannot move referral from {from} to {to}")]
    InvalidTransition {
        from: ReferralStatus,
        to: ReferralStatus,
    },
    #[error("Reward {0} has already been redeemed")]
    AlreadyRedeemed(String),
    #[error("Reward {0} expired on {1}")]
    Expired(String, DateTime<Utc>),
    #[error("Credit balance of user {0} would overflow")]
    Overflow(String),
}

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    referrals: Vec<Referral>,
    rewards: Vec<ReferralReward>,
}

/// Result of a status change; `reward` is set only on conversion.
#[derive(Clone, Debug, Serialize)]
pub struct StatusUpdate {
    pub referral: Referral,
    pub reward: Option<ReferralReward>,
}

/// A referrer together with their referrals and rewards, read at one point in time.
#[derive(Clone, Debug)]
pub struct ReferrerActivity {
    pub user: User,
    pub referrals: Vec<Referral>,
    pub rewards: Vec<ReferralReward>,
}

/// In-memory store of referrers, their referrals and the rewards those earned.
///
/// Every mutation holds the write lock for its whole duration, so a
/// conversion updates the referral, the referrer and the reward list together.
#[derive(Clone, Default)]
pub struct ReferralRepository {
    state: Arc<RwLock<StoreState>>,
}

impl StoreState {
    fn referrals_by_referrer(&self, referrer_email: &str) -> Vec<Referral> {
        self.referrals
            .iter()
            .filter(|referral| referral.referrer_email.eq_ignore_ascii_case(referrer_email))
            .cloned()
            .collect()
    }

    fn rewards_for_user(&self, user_id: &str) -> Vec<ReferralReward> {
        self.rewards
            .iter()
            .filter(|reward| reward.user_id == user_id)
            .cloned()
            .collect()
    }
}

fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

impl ReferralRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|user| user.has_email(&new_user.email)) {
            return Err(StoreError::Conflict(format!(
                "a referrer with email {} already exists",
                new_user.email.trim()
            )));
        }

        let user = User::new(new_id(), new_user, Utc::now());
        state.users.push(user.clone());

        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Option<User> {
        let state = self.state.read().await;
        state.users.iter().find(|user| user.id == id).cloned()
    }

    pub async fn add_referral(
        &self,
        referrer_email: &str,
        new_referral: NewReferral,
    ) -> Result<Referral, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let referrer = state
            .users
            .iter_mut()
            .find(|user| user.has_email(referrer_email))
            .ok_or_else(|| StoreError::NotFound("User", referrer_email.to_string()))?;
        referrer.total_referrals += 1;

        let referral = Referral::pending(new_id(), referrer.email.clone(), new_referral, Utc::now());
        state.referrals.push(referral.clone());

        Ok(referral)
    }

    pub async fn update_referral_status(
        &self,
        id: &str,
        status: ReferralStatus,
    ) -> Result<StatusUpdate, StoreError> {
        self.update_referral_status_at(id, status, Utc::now()).await
    }

    async fn update_referral_status_at(
        &self,
        id: &str,
        status: ReferralStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdate, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let referral = state
            .referrals
            .iter_mut()
            .find(|referral| referral.id == id)
            .ok_or_else(|| StoreError::NotFound("Referral", id.to_string()))?;

        if !referral.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: referral.status,
                to: status,
            });
        }

        if status != ReferralStatus::Converted {
            referral.status = status;
            return Ok(StatusUpdate {
                referral: referral.clone(),
                reward: None,
            });
        }

        let referrer = state
            .users
            .iter_mut()
            .find(|user| user.has_email(&referral.referrer_email))
            .ok_or_else(|| StoreError::NotFound("User", referral.referrer_email.clone()))?;

        let credits = referrer
            .record_conversion()
            .ok_or_else(|| StoreError::Overflow(referrer.id.clone()))?;
        referral.status = status;
        referral.date_converted = Some(now);
        referral.reward_earned = Some(credits);

        let reward = ReferralReward::earned(
            new_id(),
            referrer.id.clone(),
            referral.id.clone(),
            credits,
            now,
        );
        state.rewards.push(reward.clone());

        Ok(StatusUpdate {
            referral: referral.clone(),
            reward: Some(reward),
        })
    }

    /// Grants a reward outside the conversion flow. The credits count towards
    /// the user's balance like any other reward.
    pub async fn add_reward(&self, new_reward: NewReward) -> Result<ReferralReward, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let user = state
            .users
            .iter_mut()
            .find(|user| user.id == new_reward.user_id)
            .ok_or_else(|| StoreError::NotFound("User", new_reward.user_id.clone()))?;
        user.maintenance_credits = user
            .maintenance_credits
            .checked_add(new_reward.credits_earned)
            .ok_or_else(|| StoreError::Overflow(user.id.clone()))?;

        let reward = ReferralReward::earned(
            new_id(),
            new_reward.user_id,
            new_reward.referral_id,
            new_reward.credits_earned,
            new_reward.date_earned.unwrap_or_else(Utc::now),
        );
        state.rewards.push(reward.clone());

        Ok(reward)
    }

    pub async fn redeem_reward(&self, id: &str) -> Result<ReferralReward, StoreError> {
        self.redeem_reward_at(id, Utc::now()).await
    }

    async fn redeem_reward_at(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReferralReward, StoreError> {
        let mut state = self.state.write().await;

        let reward = state
            .rewards
            .iter_mut()
            .find(|reward| reward.id == id)
            .ok_or_else(|| StoreError::NotFound("Reward", id.to_string()))?;

        if reward.is_redeemed {
            return Err(StoreError::AlreadyRedeemed(reward.id.clone()));
        }
        if reward.is_expired(now) {
            return Err(StoreError::Expired(reward.id.clone(), reward.expiration_date));
        }

        reward.is_redeemed = true;
        reward.date_redeemed = Some(now);

        Ok(reward.clone())
    }

    pub async fn list_referrals(&self, filter: &ReferralFilter) -> Vec<Referral> {
        let state = self.state.read().await;
        state
            .referrals
            .iter()
            .filter(|referral| filter.matches(referral))
            .cloned()
            .collect()
    }

    /// The user's referrals and rewards, taken under one read lock so a
    /// converted referral is never seen without its reward.
    pub async fn referrer_activity(&self, user_id: &str) -> Option<ReferrerActivity> {
        let state = self.state.read().await;
        let user = state.users.iter().find(|user| user.id == user_id)?.clone();

        Some(ReferrerActivity {
            referrals: state.referrals_by_referrer(&user.email),
            rewards: state.rewards_for_user(&user.id),
            user,
        })
    }

    pub async fn all_rewards(&self) -> Vec<ReferralReward> {
        self.state.read().await.rewards.clone()
    }
}
