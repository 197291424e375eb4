use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{dispatch, ApiError, AppState};
use crate::models::referrals::{NewReferral, WizardStep};
use crate::services::referrals::{ReferralRequest, ReferrerInfo};
use crate::services::ServiceError;

#[derive(Deserialize)]
pub struct LandingQuery {
    #[serde(rename = "ref")]
    referral_code: Option<String>,
}

pub async fn validate_step(
    WithRejection(Path(step), _): WithRejection<Path<u8>, ApiError>,
    WithRejection(Json(referral), _): WithRejection<Json<NewReferral>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let step = WizardStep::from_number(step)
        .ok_or_else(|| ServiceError::BadRequest(format!("Unknown wizard step {}", step)))?;

    referral.validate_step(step).map_err(ServiceError::from)?;

    Ok(Json(json!({ "valid": true })))
}

pub async fn landing(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LandingQuery>, ApiError>,
) -> Result<Json<ReferrerInfo>, ApiError> {
    let info = dispatch(&state.referral_channel, |response| {
        ReferralRequest::LookupReferrer {
            referral_code: query.referral_code,
            response,
        }
    })
    .await?;

    Ok(Json(info))
}
