use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::not_blank;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Contacted,
    Converted,
    Rejected,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Contacted => "contacted",
            ReferralStatus::Converted => "converted",
            ReferralStatus::Rejected => "rejected",
        }
    }

    /// pending -> {contacted, converted, rejected}; contacted -> {converted, rejected}.
    pub fn can_transition_to(self, next: ReferralStatus) -> bool {
        use ReferralStatus::*;

        matches!(
            (self, next),
            (Pending, Contacted | Converted | Rejected) | (Contacted, Converted | Rejected)
        )
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown referral status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ReferralStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReferralStatus::Pending),
            "contacted" => Ok(ReferralStatus::Contacted),
            "converted" => Ok(ReferralStatus::Converted),
            "rejected" => Ok(ReferralStatus::Rejected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referrer_email: String,
    pub business_name: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website_url: Option<String>,
    pub service_needs: String,
    pub additional_notes: Option<String>,
    pub status: ReferralStatus,
    pub date_submitted: DateTime<Utc>,
    pub date_converted: Option<DateTime<Utc>>,
    pub reward_earned: Option<u32>,
}

impl Referral {
    pub fn pending(
        id: String,
        referrer_email: String,
        new_referral: NewReferral,
        date_submitted: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            referrer_email,
            business_name: new_referral.business_name.trim().to_string(),
            contact_person: new_referral.contact_person.trim().to_string(),
            contact_email: new_referral.contact_email.trim().to_string(),
            contact_phone: new_referral.contact_phone.trim().to_string(),
            website_url: non_empty(new_referral.website_url),
            service_needs: new_referral.service_needs.trim().to_string(),
            additional_notes: non_empty(new_referral.additional_notes),
            status: ReferralStatus::Pending,
            date_submitted,
            date_converted: None,
            reward_earned: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Body of the referral submission wizard.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReferral {
    #[validate(custom(function = "not_blank", message = "Business name is required"))]
    pub business_name: String,
    #[validate(custom(function = "not_blank", message = "Contact person is required"))]
    pub contact_person: String,
    #[validate(custom = "validate_contact_email")]
    pub contact_email: String,
    #[validate(custom(function = "not_blank", message = "Phone number is required"))]
    pub contact_phone: String,
    pub website_url: Option<String>,
    #[validate(custom(function = "not_blank", message = "Please specify the service needs"))]
    pub service_needs: String,
    pub additional_notes: Option<String>,
}

fn validate_contact_email(email: &str) -> Result<(), ValidationError> {
    let (code, message) = if email.trim().is_empty() {
        ("required", "Email is required")
    } else if !validator::validate_email(email.trim()) {
        ("email", "Please enter a valid email address")
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    Err(error)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    Business,
    Contact,
    Needs,
}

impl WizardStep {
    pub fn from_number(step: u8) -> Option<Self> {
        match step {
            1 => Some(WizardStep::Business),
            2 => Some(WizardStep::Contact),
            3 => Some(WizardStep::Needs),
            _ => None,
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            WizardStep::Business => &["business_name", "contact_person"],
            WizardStep::Contact => &["contact_email", "contact_phone"],
            WizardStep::Needs => &["service_needs"],
        }
    }
}

impl NewReferral {
    /// Validates only the fields collected by one wizard step.
    pub fn validate_step(&self, step: WizardStep) -> Result<(), ValidationErrors> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };

        let mut step_errors = ValidationErrors::new();
        for (field, field_errors) in errors.field_errors() {
            if step.fields().contains(&field) {
                for error in field_errors {
                    step_errors.add(field, error.clone());
                }
            }
        }

        if step_errors.errors().is_empty() {
            Ok(())
        } else {
            Err(step_errors)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReferralFilter {
    pub status: Option<ReferralStatus>,
    pub search: Option<String>,
}

impl ReferralFilter {
    pub fn matches(&self, referral: &Referral) -> bool {
        if let Some(status) = self.status {
            if referral.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    &referral.business_name,
                    &referral.contact_person,
                    &referral.contact_email,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> NewReferral {
        NewReferral {
            business_name: "Digital Marketing Pro".to_string(),
            contact_person: "Sarah Johnson".to_string(),
            contact_email: "sarah@digitalmarketingpro.com".to_string(),
            contact_phone: "+1-555-0123".to_string(),
            website_url: Some("  ".to_string()),
            service_needs: "E-commerce website development".to_string(),
            additional_notes: None,
        }
    }

    #[test]
    fn test_transition_table() {
        use ReferralStatus::*;

        assert!(Pending.can_transition_to(Contacted));
        assert!(Pending.can_transition_to(Converted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Contacted.can_transition_to(Converted));
        assert!(Contacted.can_transition_to(Rejected));

        assert!(!Pending.can_transition_to(Pending));
        assert!(!Contacted.can_transition_to(Pending));
        for terminal in [Converted, Rejected] {
            for next in [Pending, Contacted, Converted, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Converted".parse::<ReferralStatus>().unwrap(), ReferralStatus::Converted);
        assert!("archived".parse::<ReferralStatus>().is_err());
    }

    #[test]
    fn test_wizard_steps_only_report_their_fields() {
        let referral = NewReferral {
            business_name: "Local Restaurant Chain".to_string(),
            contact_person: "Mike Rodriguez".to_string(),
            contact_email: "mike@".to_string(),
            ..Default::default()
        };

        assert!(referral.validate_step(WizardStep::Business).is_ok());

        let contact = referral.validate_step(WizardStep::Contact).unwrap_err();
        let fields = contact.field_errors();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["contact_email"][0].code, "email");
        assert!(fields.contains_key("contact_phone"));

        let needs = referral.validate_step(WizardStep::Needs).unwrap_err();
        assert!(needs.field_errors().contains_key("service_needs"));
    }

    #[test]
    fn test_blank_email_is_required_not_malformed() {
        let referral = NewReferral {
            contact_email: "   ".to_string(),
            ..complete()
        };
        let errors = referral.validate_step(WizardStep::Contact).unwrap_err();
        assert_eq!(errors.field_errors()["contact_email"][0].code, "required");
    }

    #[test]
    fn test_pending_referral_drops_blank_optionals() {
        let referral = Referral::pending(
            "ref-1".to_string(),
            "john@example.com".to_string(),
            complete(),
            Utc::now(),
        );
        assert_eq!(referral.status, ReferralStatus::Pending);
        assert_eq!(referral.website_url, None);
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_filter_by_status_and_search() {
        let mut referral = Referral::pending(
            "ref-1".to_string(),
            "john@example.com".to_string(),
            complete(),
            Utc::now(),
        );

        let filter = ReferralFilter {
            status: Some(ReferralStatus::Pending),
            search: Some("SARAH".to_string()),
        };
        assert!(filter.matches(&referral));

        referral.status = ReferralStatus::Contacted;
        assert!(!filter.matches(&referral));

        let by_search = ReferralFilter {
            status: None,
            search: Some("restaurant".to_string()),
        };
        assert!(!by_search.matches(&referral));
        assert!(ReferralFilter::default().matches(&referral));
    }
}
