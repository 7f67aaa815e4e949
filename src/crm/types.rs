use serde::Serialize;
use serde_json::Value;

use crate::submission::normalize::NormalizedContact;
use crate::submission::Submission;

/// Body of `POST /contacts/`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub location_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldValue>,
}

/// Body of `PUT /contacts/{id}`. Only populated fields are sent, so a blank
/// in the current submission never clears a value the CRM already holds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldValue>,
}

impl ContactPatch {
    pub fn from_contact(contact: &NormalizedContact, custom_fields: Vec<CustomFieldValue>) -> Self {
        Self {
            first_name: non_empty(&contact.first_name),
            last_name: non_empty(&contact.last_name),
            email: non_empty(&contact.email),
            phone: non_empty(&contact.phone),
            custom_fields,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.custom_fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomFieldValue {
    pub id: String,
    pub value: String,
}

/// Map submission keys onto CRM custom field ids, skipping absent and
/// empty values.
pub fn custom_field_values(
    submission: &Submission,
    mapping: &[(String, String)],
) -> Vec<CustomFieldValue> {
    mapping
        .iter()
        .filter_map(|(key, id)| {
            let value = submission.text(key);
            (!value.is_empty()).then(|| CustomFieldValue {
                id: id.clone(),
                value,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteBody<'a> {
    pub body: &'a str,
}

/// Pull a contact id out of the shapes the CRM replies with:
/// `{id}`, `{contact: {id}}` or `{contacts: [{id}, ..]}`.
pub fn extract_contact_id(body: &Value) -> Option<String> {
    let candidate = body
        .get("id")
        .or_else(|| body.get("contact").and_then(|c| c.get("id")))
        .or_else(|| {
            body.get("contacts")
                .and_then(|c| c.as_array())
                .and_then(|arr| arr.first())
                .and_then(|c| c.get("id"))
        })?;

    match candidate {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
