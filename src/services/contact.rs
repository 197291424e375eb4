use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use validator::Validate;

use super::{RequestHandler, Service, ServiceError};
use crate::models::contact::ContactForm;
use crate::repositories::email::Mailer;

pub enum ContactRequest {
    Send {
        form: ContactForm,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ContactRequestHandler {
    mailer: Arc<dyn Mailer>,
    to_email: String,
}

impl ContactRequestHandler {
    pub fn new(mailer: Arc<dyn Mailer>, to_email: String) -> Self {
        ContactRequestHandler { mailer, to_email }
    }

    async fn send(&self, form: ContactForm) -> Result<(), ServiceError> {
        form.validate()?;

        let params = form.into_template_params(&self.to_email);
        self.mailer.send(&params).await.map_err(|e| {
            log::error!("Contact email from {} failed: {}", params.from_email, e);
            ServiceError::ExternalService(
                "ContactService".to_string(),
                "EmailApi".to_string(),
                e.to_string(),
            )
        })?;

        log::info!("Relayed contact request from {}.", params.from_email);
        Ok(())
    }
}

#[async_trait]
impl RequestHandler<ContactRequest> for ContactRequestHandler {
    async fn handle_request(&self, request: ContactRequest) {
        match request {
            ContactRequest::Send { form, response } => {
                let result = self.send(form).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct ContactService;

impl ContactService {
    pub fn new() -> Self {
        ContactService {}
    }
}

#[async_trait]
impl Service<ContactRequest, ContactRequestHandler> for ContactService {}
