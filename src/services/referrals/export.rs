use crate::models::referrals::Referral;

pub const EXPORT_FILENAME: &str = "referrals-export.csv";

const HEADER: [&str; 7] = [
    "Business Name",
    "Contact Person",
    "Email",
    "Phone",
    "Status",
    "Date Submitted",
    "Service Needs",
];

pub fn referrals_csv(referrals: &[Referral]) -> String {
    let mut csv = HEADER.join(",");

    for referral in referrals {
        let date_submitted = referral.date_submitted.format("%Y-%m-%d").to_string();
        let row = [
            referral.business_name.as_str(),
            referral.contact_person.as_str(),
            referral.contact_email.as_str(),
            referral.contact_phone.as_str(),
            referral.status.as_str(),
            date_submitted.as_str(),
            referral.service_needs.as_str(),
        ];

        csv.push('\n');
        csv.push_str(
            &row.iter()
                .map(|field| escape(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    csv
}

fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::referrals::NewReferral;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_export_columns_and_quoting() {
        let referral = Referral::pending(
            "ref-2".to_string(),
            "john@example.com".to_string(),
            NewReferral {
                business_name: "Local Restaurant Chain".to_string(),
                contact_person: "Mike Rodriguez".to_string(),
                contact_email: "mike@localrestaurant.com".to_string(),
                contact_phone: "+1-555-0456".to_string(),
                service_needs: "Website, with \"online\" ordering".to_string(),
                ..Default::default()
            },
            Utc.with_ymd_and_hms(2024, 2, 15, 9, 15, 0).unwrap(),
        );

        let csv = referrals_csv(&[referral]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Business Name,Contact Person,Email,Phone,Status,Date Submitted,Service Needs"
        );
        assert_eq!(
            lines[1],
            "Local Restaurant Chain,Mike Rodriguez,mike@localrestaurant.com,+1-555-0456,pending,2024-02-15,\"Website, with \"\"online\"\" ordering\""
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(referrals_csv(&[]).lines().count(), 1);
    }
}
