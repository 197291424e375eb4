use anyhow::bail;
use async_trait::async_trait;
use serde_json::json;

use crate::models::contact::TemplateParams;

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, params: &TemplateParams) -> Result<(), anyhow::Error>;
}

/// Client for the transactional email API the contact form relays through.
pub struct EmailApi {
    url: String,
    service_id: String,
    template_id: String,
    public_key: String,
    client: reqwest::Client,
}

impl EmailApi {
    pub fn new(url: String, service_id: String, template_id: String, public_key: String) -> Self {
        Self {
            url,
            service_id,
            template_id,
            public_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for EmailApi {
    async fn send(&self, params: &TemplateParams) -> Result<(), anyhow::Error> {
        let payload = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": params,
        });

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.url.trim_end_matches('/')))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Email API: {} {}", status, body);
        }

        Ok(())
    }
}
