use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::config::{Config, Strategy};
use crate::crm::types::{custom_field_values, ContactDraft, ContactPatch, CustomFieldValue};
use crate::crm::{CrmClient, CrmError};
use crate::error::{RelayError, UpstreamStep};
use crate::submission::normalize::{normalize, NormalizedContact};
use crate::submission::note::{format_note, NoteHeader};
use crate::submission::Submission;

use super::{ContactAction, Relay, RelayOutcome};

/// Writes the submission straight into the CRM: optional lookup, contact
/// create or update, then an audit note.
pub struct UpsertRelay {
    client: CrmClient,
    lookup: bool,
    note_label: String,
    contact_source: Option<String>,
    contact_tags: Vec<String>,
    custom_fields: Vec<(String, String)>,
}

impl UpsertRelay {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            client: CrmClient::new(&config.crm)?,
            lookup: config.strategy == Strategy::Lookup,
            note_label: config.note_label.clone(),
            contact_source: config.crm.contact_source.clone(),
            contact_tags: config.crm.contact_tags.clone(),
            custom_fields: config.crm.custom_fields.clone(),
        })
    }

    /// Existing contact id for this email/phone. Any lookup failure counts
    /// as no match so the request falls through to create.
    pub async fn find_existing(&self, contact: &NormalizedContact) -> Option<String> {
        if !self.lookup || !contact.has_lookup_key() {
            return None;
        }

        match self.client.find_contact(&contact.email, &contact.phone).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Contact lookup degraded, creating instead: {e}");
                None
            }
        }
    }

    pub async fn upsert_contact(
        &self,
        existing: Option<String>,
        contact: &NormalizedContact,
        custom_fields: Vec<CustomFieldValue>,
    ) -> Result<(String, ContactAction), RelayError> {
        match existing {
            Some(id) => {
                let patch = ContactPatch::from_contact(contact, custom_fields);
                self.client
                    .update_contact(&id, &patch)
                    .await
                    .map_err(|e| upstream(UpstreamStep::Update, e))?;
                Ok((id, ContactAction::Updated))
            }
            None => {
                let draft = ContactDraft {
                    location_id: self.client.location_id().to_string(),
                    first_name: contact.first_name.clone(),
                    last_name: contact.last_name.clone(),
                    email: contact.email.clone(),
                    phone: contact.phone.clone(),
                    source: self.contact_source.clone(),
                    tags: self.contact_tags.clone(),
                    custom_fields,
                };
                let id = self
                    .client
                    .create_contact(&draft)
                    .await
                    .map_err(|e| upstream(UpstreamStep::Create, e))?;
                Ok((id, ContactAction::Created))
            }
        }
    }

    /// Attach the note. A failure comes back as the warning payload and
    /// never undoes the contact step.
    pub async fn attach_note(&self, contact_id: &str, note: &str) -> Option<Value> {
        match self.client.create_note(contact_id, note).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(contact_id, "Note attach failed: {e}");
                Some(e.detail())
            }
        }
    }
}

#[async_trait]
impl Relay for UpsertRelay {
    fn strategy(&self) -> Strategy {
        if self.lookup {
            Strategy::Lookup
        } else {
            Strategy::Direct
        }
    }

    async fn relay(&self, submission: &Submission) -> Result<RelayOutcome, RelayError> {
        let contact = normalize(submission);
        let custom_fields = custom_field_values(submission, &self.custom_fields);

        let existing = self.find_existing(&contact).await;
        tracing::debug!(matched = existing.is_some(), "Lookup attempted");

        let (contact_id, action) = self
            .upsert_contact(existing, &contact, custom_fields)
            .await?;
        tracing::info!(contact_id = %contact_id, action = ?action, "Contact upserted");

        let note = format_note(
            submission,
            &NoteHeader {
                label: &self.note_label,
                date: Some(Utc::now()),
            },
        );
        let note_warning = self.attach_note(&contact_id, &note).await;

        Ok(RelayOutcome {
            contact_id: Some(contact_id),
            action,
            note_warning,
        })
    }
}

fn upstream(step: UpstreamStep, err: CrmError) -> RelayError {
    RelayError::Upstream {
        step,
        status: err.status(),
        detail: err.detail(),
    }
}
