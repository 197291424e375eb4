use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
}

#[derive(Debug, Deserialize)]
pub struct Referrals {
    /// Public origin of the marketing site; referral links are built on it.
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Email {
    pub url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub to_email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Admin {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub referrals: Referrals,
    pub email: Email,
    #[serde(default)]
    pub admin: Admin,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("WAGUS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
