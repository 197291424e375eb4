use validator::ValidationError;

pub mod contact;
pub mod referrals;
pub mod rewards;
pub mod summaries;
pub mod tiers;
pub mod users;

/// Rejects empty and whitespace-only form fields.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }

    Ok(())
}
