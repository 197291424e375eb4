use anyhow::bail;
use url::{form_urlencoded, Url};

/// Builds the shareable `/referral?ref=<user id>` links.
#[derive(Clone, Debug)]
pub struct ReferralLinks {
    base: Url,
}

impl ReferralLinks {
    pub fn new(base_url: &str) -> Result<Self, anyhow::Error> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            bail!("Referral base URL cannot carry a path: {}", base_url);
        }

        Ok(Self { base })
    }

    pub fn for_user(&self, user_id: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("referral");
        }
        url.query_pairs_mut().clear().append_pair("ref", user_id);
        url.to_string()
    }

    /// Where the landing page sends a referred visitor next.
    pub fn contact_path(referral_code: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("ref", referral_code)
            .finish();
        format!("/contact?{}", query)
    }
}
