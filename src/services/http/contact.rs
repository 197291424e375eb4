use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use super::{dispatch, ApiError, AppState};
use crate::models::contact::ContactForm;
use crate::services::contact::ContactRequest;

pub async fn send_contact(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<ContactForm>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let email = form.email.clone();

    let result = dispatch(&state.contact_channel, |response| ContactRequest::Send {
        form,
        response,
    })
    .await;

    match result {
        Ok(()) => Ok(Json(json!({
            "message": format!(
                "Thank you! Your message has been sent successfully. We'll get back to you within 24 hours at {}",
                email
            )
        }))),
        Err(e) if e.status == StatusCode::BAD_GATEWAY => Err(ApiError::new(
            StatusCode::BAD_GATEWAY,
            "Email delivery failed",
            "Sorry, there was an error sending your message. Please try again or email us directly.",
        )),
        Err(e) => Err(e),
    }
}
