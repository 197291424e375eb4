use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;
use validator::ValidationErrors;

use super::{contact::ContactRequest, referrals::ReferralRequest, ServiceError};
use crate::repositories::referrals::StoreError;

mod admin;
mod contact;
mod referrals;
mod users;

#[derive(Clone)]
pub struct AppState {
    pub referral_channel: mpsc::Sender<ReferralRequest>,
    pub contact_channel: mpsc::Sender<ContactRequest>,
    pub admin_token: Option<String>,
}

/// Error body returned by every route: `{"error": ..., "details": ...}`.
///
/// Extractors are wrapped in `WithRejection` so malformed bodies, paths and
/// query strings produce the same shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Value,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, details: impl Into<Value>) -> Self {
        Self {
            status,
            error: error.to_string(),
            details: details.into(),
        }
    }

    fn internal(details: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", details)
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        let details = error.to_string();

        match error {
            ServiceError::Validation(errors) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed",
                validation_details(&errors),
            ),
            ServiceError::Store(StoreError::NotFound(..)) => {
                ApiError::new(StatusCode::NOT_FOUND, "Not found", details)
            }
            ServiceError::Store(StoreError::Conflict(_)) => {
                ApiError::new(StatusCode::CONFLICT, "Conflict", details)
            }
            ServiceError::Store(StoreError::InvalidTransition { .. }) => {
                ApiError::new(StatusCode::CONFLICT, "Invalid status transition", details)
            }
            ServiceError::Store(StoreError::AlreadyRedeemed(_)) => {
                ApiError::new(StatusCode::CONFLICT, "Reward already redeemed", details)
            }
            ServiceError::Store(StoreError::Expired(..)) => {
                ApiError::new(StatusCode::GONE, "Reward expired", details)
            }
            ServiceError::Store(StoreError::Overflow(_)) => {
                ApiError::new(StatusCode::CONFLICT, "Credit overflow", details)
            }
            ServiceError::BadRequest(_) => ApiError::new(StatusCode::BAD_REQUEST, "Bad request", details),
            ServiceError::ExternalService(..) => {
                ApiError::new(StatusCode::BAD_GATEWAY, "External service error", details)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), "Invalid request body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(rejection.status(), "Invalid path parameter", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(rejection.status(), "Invalid query string", rejection.body_text())
    }
}

/// Field errors keyed by their camelCase wire names.
fn validation_details(errors: &ValidationErrors) -> Value {
    errors
        .errors()
        .iter()
        .map(|(field, kind)| {
            let kind = serde_json::to_value(kind).unwrap_or(Value::Null);
            (camel_case(field), kind)
        })
        .collect::<Map<String, Value>>()
        .into()
}

fn camel_case(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;

    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }

    name
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.error,
                "details": self.details
            })),
        )
            .into_response()
    }
}

/// Sends a request to a service and waits for its reply.
async fn dispatch<R, T>(
    channel: &mpsc::Sender<R>,
    request: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> R,
) -> Result<T, ApiError>
where
    R: Send,
{
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(request(response_tx))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to process request: {}", e)))?;

    response_rx
        .await
        .map_err(|e| ApiError::internal(format!("Failed to receive response: {}", e)))?
        .map_err(ApiError::from)
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/referrals", get(admin::list_referrals))
        .route("/referrals/export", get(admin::export_referrals))
        .route("/referrals/{id}/status", put(admin::update_status))
        .route("/rewards", post(admin::grant_reward))
        .route("/analytics", get(admin::analytics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/users", post(users::register_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/dashboard", get(users::get_dashboard))
        .route("/users/{id}/rewards", get(users::get_reward_summary))
        .route("/users/{id}/referrals", post(users::submit_referral))
        .route("/rewards/{id}/redeem", post(users::redeem_reward))
        .route("/referrals/validate/{step}", post(referrals::validate_step))
        .route("/referral", get(referrals::landing))
        .route("/contact", post(contact::send_contact))
        .nest("/admin", admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
