use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    pub phone: String,
    pub company: String,
    pub website: String,
    pub project_type: String,
    pub budget: String,
    pub timeline: String,
    #[validate(custom(function = "not_blank", message = "Message is required"))]
    pub message: String,
    pub hear_about: String,
    /// Referrer id carried over from the referral landing page.
    pub referral_code: Option<String>,
}

/// Parameters handed to the email template.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub phone: String,
    pub company: String,
    pub website: String,
    pub project_type: String,
    pub budget: String,
    pub timeline: String,
    pub message: String,
    pub hear_about: String,
    pub to_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

impl ContactForm {
    pub fn into_template_params(self, to_email: &str) -> TemplateParams {
        TemplateParams {
            from_name: self.name,
            from_email: self.email,
            phone: self.phone,
            company: self.company,
            website: self.website,
            project_type: self.project_type,
            budget: self.budget,
            timeline: self.timeline,
            message: self.message,
            hear_about: self.hear_about,
            to_email: to_email.to_string(),
            referral_code: self.referral_code.filter(|code| !code.trim().is_empty()),
        }
    }
}
