use serde::Serialize;

use super::Submission;

/// The identity fields a CRM contact is keyed on. Missing values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl NormalizedContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_lookup_key(&self) -> bool {
        !self.email.is_empty() || !self.phone.is_empty()
    }
}

/// Keys consumed by `normalize`; camelCase wins over the snake_case alias.
pub const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name"];
pub const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name"];
pub const EMAIL_KEYS: &[&str] = &["email"];
pub const PHONE_KEYS: &[&str] = &["phone"];

pub fn normalize(submission: &Submission) -> NormalizedContact {
    NormalizedContact {
        first_name: first_present(submission, FIRST_NAME_KEYS),
        last_name: first_present(submission, LAST_NAME_KEYS),
        email: first_present(submission, EMAIL_KEYS),
        phone: first_present(submission, PHONE_KEYS),
    }
}

fn first_present(submission: &Submission, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| submission.text(k).trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}
