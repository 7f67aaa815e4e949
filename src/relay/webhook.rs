use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::config::{Config, Strategy};
use crate::crm::client::read_body;
use crate::error::{RelayError, UpstreamStep};
use crate::submission::normalize::normalize;
use crate::submission::note::{format_note, NoteHeader};
use crate::submission::Submission;

use super::{ContactAction, Relay, RelayOutcome};

/// Forwards the submission to an automation webhook that owns the CRM
/// write. No contact id comes back.
pub struct WebhookRelay {
    client: reqwest::Client,
    url: String,
    note_label: String,
    source: String,
}

impl WebhookRelay {
    pub fn new(config: &Config) -> Result<Self, String> {
        let url = config
            .webhook_url
            .clone()
            .ok_or_else(|| "RELAY_WEBHOOK_URL is not configured".to_string())?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("submission-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            url,
            note_label: config.note_label.clone(),
            source: config
                .crm
                .contact_source
                .clone()
                .unwrap_or_else(|| config.note_label.clone()),
        })
    }
}

#[async_trait]
impl Relay for WebhookRelay {
    fn strategy(&self) -> Strategy {
        Strategy::Webhook
    }

    async fn relay(&self, submission: &Submission) -> Result<RelayOutcome, RelayError> {
        let contact = normalize(submission);
        let note = format_note(
            submission,
            &NoteHeader {
                label: &self.note_label,
                date: Some(Utc::now()),
            },
        );

        let body = json!({
            "first_name": contact.first_name,
            "last_name": contact.last_name,
            "email": contact.email,
            "phone": contact.phone,
            "source": self.source,
            "note": note,
            "submission": submission.as_map(),
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream {
                step: UpstreamStep::Forward,
                status: None,
                detail: json!({ "error": format!("Webhook request failed: {e}") }),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = read_body(resp).await;
            return Err(RelayError::Upstream {
                step: UpstreamStep::Forward,
                status: Some(status.as_u16()),
                detail,
            });
        }

        tracing::info!(status = status.as_u16(), "Submission forwarded to webhook");

        Ok(RelayOutcome {
            contact_id: None,
            action: ContactAction::Forwarded,
            note_warning: None,
        })
    }
}
