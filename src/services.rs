use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use validator::ValidationErrors;

use crate::repositories::email::EmailApi;
use crate::repositories::referrals::{ReferralRepository, StoreError};
use crate::settings::Settings;

mod contact;
mod http;
mod referrals;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("External service error: {0} -> {1} => {2}")]
    ExternalService(String, String, String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(settings: Settings) -> Result<(), anyhow::Error> {
    let (referral_tx, mut referral_rx) = mpsc::channel(512);
    let (contact_tx, mut contact_rx) = mpsc::channel(512);

    let mut referral_service = referrals::ReferralService::new();
    let mut contact_service = contact::ContactService::new();

    let links = referrals::ReferralLinks::new(&settings.referrals.base_url)?;

    log::info!("Starting referral service.");
    tokio::spawn(async move {
        let handler = referrals::ReferralRequestHandler::new(ReferralRepository::new(), links);
        referral_service.run(handler, &mut referral_rx).await;
    });

    log::info!("Starting contact service.");
    let email = settings.email;
    tokio::spawn(async move {
        let mailer = EmailApi::new(email.url, email.service_id, email.template_id, email.public_key);
        let handler = contact::ContactRequestHandler::new(Arc::new(mailer), email.to_email);
        contact_service.run(handler, &mut contact_rx).await;
    });

    if settings.admin.token.is_none() {
        log::warn!("No admin token configured; admin routes are open.");
    }

    log::info!("Starting HTTP server.");
    let state = http::AppState {
        referral_channel: referral_tx,
        contact_channel: contact_tx,
        admin_token: settings.admin.token,
    };
    http::start_http_server(&settings.server.listen, state).await
}
