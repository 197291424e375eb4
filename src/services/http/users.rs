use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;

use super::{dispatch, ApiError, AppState};
use crate::models::referrals::{NewReferral, Referral};
use crate::models::rewards::ReferralReward;
use crate::models::summaries::{Dashboard, RewardSummary};
use crate::models::users::{NewUser, User};
use crate::services::referrals::ReferralRequest;

pub async fn register_user(
    State(state): State<AppState>,
    WithRejection(Json(user), _): WithRejection<Json<NewUser>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = dispatch(&state.referral_channel, |response| {
        ReferralRequest::RegisterUser { user, response }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<User>, ApiError> {
    let user = dispatch(&state.referral_channel, |response| ReferralRequest::GetUser {
        id,
        response,
    })
    .await?;

    Ok(Json(user))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = dispatch(&state.referral_channel, |response| {
        ReferralRequest::GetDashboard { user_id, response }
    })
    .await?;

    Ok(Json(dashboard))
}

pub async fn get_reward_summary(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<RewardSummary>, ApiError> {
    let summary = dispatch(&state.referral_channel, |response| {
        ReferralRequest::GetRewardSummary { user_id, response }
    })
    .await?;

    Ok(Json(summary))
}

pub async fn submit_referral(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(referral), _): WithRejection<Json<NewReferral>, ApiError>,
) -> Result<Json<Referral>, ApiError> {
    let referral = dispatch(&state.referral_channel, |response| {
        ReferralRequest::SubmitReferral {
            user_id,
            referral,
            response,
        }
    })
    .await?;

    Ok(Json(referral))
}

pub async fn redeem_reward(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<ReferralReward>, ApiError> {
    let reward = dispatch(&state.referral_channel, |response| {
        ReferralRequest::RedeemReward { id, response }
    })
    .await?;

    Ok(Json(reward))
}
