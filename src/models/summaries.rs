//! Read models behind the dashboard, reward management and admin views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::referrals::{Referral, ReferralStatus};
use super::rewards::ReferralReward;
use super::tiers::{self, TierProgress};
use super::users::User;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: User,
    pub referral_link: String,
    pub tier_progress: TierProgress,
    pub total_referrals: usize,
    pub pending_referrals: usize,
    pub converted_referrals: usize,
    /// Sum of unredeemed rewards, expired ones included.
    pub available_credits: u32,
    pub referrals: Vec<Referral>,
}

impl Dashboard {
    pub fn build(
        user: User,
        referral_link: String,
        referrals: Vec<Referral>,
        rewards: &[ReferralReward],
    ) -> Self {
        let available_credits = rewards
            .iter()
            .filter(|reward| reward.user_id == user.id && !reward.is_redeemed)
            .fold(0, |total: u32, reward| total.saturating_add(reward.credits_earned));

        Self {
            tier_progress: tiers::tier_progress(user.successful_referrals),
            total_referrals: referrals.len(),
            pending_referrals: count_status(&referrals, ReferralStatus::Pending),
            converted_referrals: count_status(&referrals, ReferralStatus::Converted),
            available_credits,
            referral_link,
            referrals,
            user,
        }
    }
}

/// An unredeemed, unexpired reward with its remaining lifetime.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableReward {
    #[serde(flatten)]
    pub reward: ReferralReward,
    pub days_until_expiry: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSummary {
    pub available_credits: u32,
    pub expired_credits: u32,
    pub redeemed_credits: u32,
    pub total_earned: u32,
    /// Set when an unredeemed reward expires within the warning window.
    pub expiring_soon: bool,
    pub tier_progress: TierProgress,
    pub benefits: &'static [&'static str],
    pub available: Vec<AvailableReward>,
    /// Full history, newest first.
    pub rewards: Vec<ReferralReward>,
}

impl RewardSummary {
    pub fn build(user: &User, rewards: Vec<ReferralReward>, now: DateTime<Utc>) -> Self {
        let mut rewards: Vec<ReferralReward> = rewards
            .into_iter()
            .filter(|reward| reward.user_id == user.id)
            .collect();
        rewards.sort_by(|a, b| b.date_earned.cmp(&a.date_earned));

        let mut summary = Self {
            available_credits: 0,
            expired_credits: 0,
            redeemed_credits: 0,
            total_earned: 0,
            expiring_soon: rewards.iter().any(|reward| reward.is_expiring_soon(now)),
            tier_progress: tiers::tier_progress(user.successful_referrals),
            benefits: user.tier.benefits(),
            available: Vec::new(),
            rewards: Vec::new(),
        };

        for reward in &rewards {
            let credits = reward.credits_earned;
            summary.total_earned = summary.total_earned.saturating_add(credits);

            if reward.is_redeemed {
                summary.redeemed_credits = summary.redeemed_credits.saturating_add(credits);
            } else if reward.is_available(now) {
                summary.available_credits = summary.available_credits.saturating_add(credits);
                summary.available.push(AvailableReward {
                    reward: reward.clone(),
                    days_until_expiry: reward.days_until_expiry(now),
                });
            } else {
                summary.expired_credits = summary.expired_credits.saturating_add(credits);
            }
        }

        summary.rewards = rewards;
        summary
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFunnel {
    pub submitted: usize,
    /// Referrals that got at least as far as a first contact.
    pub contacted: usize,
    pub converted: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    pub total_referrals: usize,
    pub pending: usize,
    pub contacted: usize,
    pub converted: usize,
    pub rejected: usize,
    pub conversion_rate: f64,
    pub total_rewards_issued: u32,
    pub funnel: ConversionFunnel,
}

impl AdminAnalytics {
    pub fn build(referrals: &[Referral], rewards: &[ReferralReward]) -> Self {
        let total_referrals = referrals.len();
        let converted = count_status(referrals, ReferralStatus::Converted);
        let contacted = count_status(referrals, ReferralStatus::Contacted);

        let conversion_rate = if total_referrals > 0 {
            converted as f64 / total_referrals as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_referrals,
            pending: count_status(referrals, ReferralStatus::Pending),
            contacted,
            converted,
            rejected: count_status(referrals, ReferralStatus::Rejected),
            conversion_rate,
            total_rewards_issued: rewards
                .iter()
                .fold(0, |total: u32, reward| total.saturating_add(reward.credits_earned)),
            funnel: ConversionFunnel {
                submitted: total_referrals,
                contacted: contacted + converted,
                converted,
            },
        }
    }
}

fn count_status(referrals: &[Referral], status: ReferralStatus) -> usize {
    referrals.iter().filter(|r| r.status == status).count()
}
