use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::{dispatch, ApiError, AppState};
use crate::models::referrals::{Referral, ReferralFilter, ReferralStatus};
use crate::models::rewards::{NewReward, ReferralReward};
use crate::models::summaries::AdminAnalytics;
use crate::repositories::referrals::StatusUpdate;
use crate::services::referrals::{ReferralRequest, EXPORT_FILENAME};
use crate::services::ServiceError;

pub async fn require_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = state.admin_token.as_deref() {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| bool::from(presented.as_bytes().ct_eq(token.as_bytes())));

        if !authorized {
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "A valid admin token is required.",
            ));
        }
    }

    Ok(next.run(request).await)
}

#[derive(Deserialize)]
pub struct ListQuery {
    status: Option<String>,
    search: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<ReferralFilter, ServiceError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(status) => Some(
                status
                    .parse::<ReferralStatus>()
                    .map_err(|e| ServiceError::BadRequest(e.to_string()))?,
            ),
        };

        Ok(ReferralFilter {
            status,
            search: self.search,
        })
    }
}

#[derive(Deserialize)]
pub struct StatusChange {
    status: ReferralStatus,
}

pub async fn list_referrals(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, ApiError>,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let filter = query.into_filter()?;
    let referrals = dispatch(&state.referral_channel, |response| {
        ReferralRequest::ListReferrals { filter, response }
    })
    .await?;

    Ok(Json(referrals))
}

pub async fn update_status(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(change), _): WithRejection<Json<StatusChange>, ApiError>,
) -> Result<Json<StatusUpdate>, ApiError> {
    let update = dispatch(&state.referral_channel, |response| {
        ReferralRequest::UpdateStatus {
            id,
            status: change.status,
            response,
        }
    })
    .await?;

    Ok(Json(update))
}

pub async fn grant_reward(
    State(state): State<AppState>,
    WithRejection(Json(reward), _): WithRejection<Json<NewReward>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let reward: ReferralReward = dispatch(&state.referral_channel, |response| {
        ReferralRequest::GrantReward { reward, response }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(reward)))
}

pub async fn analytics(State(state): State<AppState>) -> Result<Json<AdminAnalytics>, ApiError> {
    let analytics = dispatch(&state.referral_channel, |response| {
        ReferralRequest::GetAnalytics { response }
    })
    .await?;

    Ok(Json(analytics))
}

pub async fn export_referrals(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = dispatch(&state.referral_channel, |response| {
        ReferralRequest::ExportReferrals { response }
    })
    .await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
        ),
    ];

    Ok((headers, csv))
}
