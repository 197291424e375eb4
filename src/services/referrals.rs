use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::oneshot;
use validator::Validate;

use super::{RequestHandler, Service, ServiceError};
use crate::models::referrals::{NewReferral, Referral, ReferralFilter, ReferralStatus};
use crate::models::rewards::{NewReward, ReferralReward};
use crate::models::summaries::{AdminAnalytics, Dashboard, RewardSummary};
use crate::models::users::{NewUser, User};
use crate::repositories::referrals::{
    ReferralRepository, ReferrerActivity, StatusUpdate, StoreError,
};

mod export;
mod links;

pub use export::EXPORT_FILENAME;
pub use links::ReferralLinks;

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

pub enum ReferralRequest {
    RegisterUser {
        user: NewUser,
        response: Reply<User>,
    },
    GetUser {
        id: String,
        response: Reply<User>,
    },
    GetDashboard {
        user_id: String,
        response: Reply<Dashboard>,
    },
    GetRewardSummary {
        user_id: String,
        response: Reply<RewardSummary>,
    },
    SubmitReferral {
        user_id: String,
        referral: NewReferral,
        response: Reply<Referral>,
    },
    LookupReferrer {
        referral_code: Option<String>,
        response: Reply<ReferrerInfo>,
    },
    ListReferrals {
        filter: ReferralFilter,
        response: Reply<Vec<Referral>>,
    },
    UpdateStatus {
        id: String,
        status: ReferralStatus,
        response: Reply<StatusUpdate>,
    },
    GrantReward {
        reward: NewReward,
        response: Reply<ReferralReward>,
    },
    RedeemReward {
        id: String,
        response: Reply<ReferralReward>,
    },
    GetAnalytics {
        response: Reply<AdminAnalytics>,
    },
    ExportReferrals {
        response: Reply<String>,
    },
}

/// Attribution shown on the referral landing page.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerInfo {
    pub valid: bool,
    pub name: Option<String>,
    pub company: Option<String>,
    pub contact_path: Option<String>,
}

impl ReferrerInfo {
    fn invalid() -> Self {
        Self {
            valid: false,
            name: None,
            company: None,
            contact_path: None,
        }
    }
}

#[derive(Clone)]
pub struct ReferralRequestHandler {
    repository: ReferralRepository,
    links: ReferralLinks,
}

impl ReferralRequestHandler {
    pub fn new(repository: ReferralRepository, links: ReferralLinks) -> Self {
        ReferralRequestHandler { repository, links }
    }

    async fn require_user(&self, id: &str) -> Result<User, ServiceError> {
        self.repository
            .get_user(id)
            .await
            .ok_or_else(|| StoreError::NotFound("User", id.to_string()).into())
    }

    async fn register_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        new_user.validate()?;
        let user = self.repository.register_user(new_user).await?;
        log::info!("Registered referrer {} ({}).", user.id, user.email);

        Ok(user)
    }

    async fn require_activity(&self, user_id: &str) -> Result<ReferrerActivity, ServiceError> {
        self.repository
            .referrer_activity(user_id)
            .await
            .ok_or_else(|| StoreError::NotFound("User", user_id.to_string()).into())
    }

    async fn get_dashboard(&self, user_id: &str) -> Result<Dashboard, ServiceError> {
        let activity = self.require_activity(user_id).await?;
        let link = self.links.for_user(&activity.user.id);

        Ok(Dashboard::build(
            activity.user,
            link,
            activity.referrals,
            &activity.rewards,
        ))
    }

    async fn get_reward_summary(&self, user_id: &str) -> Result<RewardSummary, ServiceError> {
        let activity = self.require_activity(user_id).await?;

        Ok(RewardSummary::build(&activity.user, activity.rewards, Utc::now()))
    }

    async fn submit_referral(
        &self,
        user_id: &str,
        referral: NewReferral,
    ) -> Result<Referral, ServiceError> {
        referral.validate()?;
        let user = self.require_user(user_id).await?;
        let referral = self.repository.add_referral(&user.email, referral).await?;
        log::info!(
            "Referral {} for {} submitted by {}.",
            referral.id,
            referral.business_name,
            user.email
        );

        Ok(referral)
    }

    async fn lookup_referrer(&self, referral_code: Option<String>) -> ReferrerInfo {
        let Some(code) = referral_code.filter(|code| !code.trim().is_empty()) else {
            return ReferrerInfo::invalid();
        };

        match self.repository.get_user(code.trim()).await {
            Some(user) => ReferrerInfo {
                valid: true,
                name: Some(user.name),
                company: Some(user.company),
                contact_path: Some(ReferralLinks::contact_path(&user.id)),
            },
            None => {
                log::debug!("Unknown referral code {}.", code);
                ReferrerInfo::invalid()
            }
        }
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReferralStatus,
    ) -> Result<StatusUpdate, ServiceError> {
        let update = self.repository.update_referral_status(id, status).await?;

        match &update.reward {
            Some(reward) => log::info!(
                "Referral {} converted; {} credit(s) granted to {}.",
                id,
                reward.credits_earned,
                reward.user_id
            ),
            None => log::info!("Referral {} moved to {}.", id, status),
        }

        Ok(update)
    }

    async fn grant_reward(&self, reward: NewReward) -> Result<ReferralReward, ServiceError> {
        let reward = self.repository.add_reward(reward).await?;
        log::info!(
            "Granted reward {} ({} credit(s)) to {}.",
            reward.id,
            reward.credits_earned,
            reward.user_id
        );

        Ok(reward)
    }

    async fn redeem_reward(&self, id: &str) -> Result<ReferralReward, ServiceError> {
        let reward = self.repository.redeem_reward(id).await.map_err(|e| {
            log::warn!("Redemption of reward {} refused: {}", id, e);
            e
        })?;
        log::info!("Reward {} redeemed by {}.", reward.id, reward.user_id);

        Ok(reward)
    }

    async fn get_analytics(&self) -> AdminAnalytics {
        let referrals = self.repository.list_referrals(&ReferralFilter::default()).await;
        let rewards = self.repository.all_rewards().await;

        AdminAnalytics::build(&referrals, &rewards)
    }

    async fn export_referrals(&self) -> String {
        let referrals = self.repository.list_referrals(&ReferralFilter::default()).await;
        log::info!("Exporting {} referral(s).", referrals.len());

        export::referrals_csv(&referrals)
    }
}

#[async_trait]
impl RequestHandler<ReferralRequest> for ReferralRequestHandler {
    async fn handle_request(&self, request: ReferralRequest) {
        match request {
            ReferralRequest::RegisterUser { user, response } => {
                let user = self.register_user(user).await;
                let _ = response.send(user);
            }
            ReferralRequest::GetUser { id, response } => {
                let user = self.require_user(&id).await;
                let _ = response.send(user);
            }
            ReferralRequest::GetDashboard { user_id, response } => {
                let dashboard = self.get_dashboard(&user_id).await;
                let _ = response.send(dashboard);
            }
            ReferralRequest::GetRewardSummary { user_id, response } => {
                let summary = self.get_reward_summary(&user_id).await;
                let _ = response.send(summary);
            }
            ReferralRequest::SubmitReferral {
                user_id,
                referral,
                response,
            } => {
                let referral = self.submit_referral(&user_id, referral).await;
                let _ = response.send(referral);
            }
            ReferralRequest::LookupReferrer {
                referral_code,
                response,
            } => {
                let info = self.lookup_referrer(referral_code).await;
                let _ = response.send(Ok(info));
            }
            ReferralRequest::ListReferrals { filter, response } => {
                let referrals = self.repository.list_referrals(&filter).await;
                let _ = response.send(Ok(referrals));
            }
            ReferralRequest::UpdateStatus {
                id,
                status,
                response,
            } => {
                let update = self.update_status(&id, status).await;
                let _ = response.send(update);
            }
            ReferralRequest::GrantReward { reward, response } => {
                let reward = self.grant_reward(reward).await;
                let _ = response.send(reward);
            }
            ReferralRequest::RedeemReward { id, response } => {
                let reward = self.redeem_reward(&id).await;
                let _ = response.send(reward);
            }
            ReferralRequest::GetAnalytics { response } => {
                let analytics = self.get_analytics().await;
                let _ = response.send(Ok(analytics));
            }
            ReferralRequest::ExportReferrals { response } => {
                let csv = self.export_referrals().await;
                let _ = response.send(Ok(csv));
            }
        }
    }
}

pub struct ReferralService;

impl ReferralService {
    pub fn new() -> Self {
        ReferralService {}
    }
}

#[async_trait]
impl Service<ReferralRequest, ReferralRequestHandler> for ReferralService {}
