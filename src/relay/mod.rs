pub mod upsert;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{Config, Strategy};
use crate::error::RelayError;
use crate::submission::Submission;

use upsert::UpsertRelay;
use webhook::WebhookRelay;

/// What happened to the contact on the CRM side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactAction {
    Created,
    Updated,
    Forwarded,
}

#[derive(Debug, Clone)]
pub struct RelayOutcome {
    pub contact_id: Option<String>,
    pub action: ContactAction,
    /// Set when the audit note could not be attached.
    pub note_warning: Option<Value>,
}

impl RelayOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self.action {
            ContactAction::Forwarded => StatusCode::ACCEPTED,
            ContactAction::Created | ContactAction::Updated => StatusCode::OK,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": true,
            "action": self.action,
        });
        if let Some(ref id) = self.contact_id {
            body["contactId"] = json!(id);
        }
        if self.action == ContactAction::Forwarded {
            body["forwarded"] = json!(true);
        }
        if let Some(ref warning) = self.note_warning {
            body["noteWarning"] = warning.clone();
        }
        body
    }
}

/// One way of delivering a submission upstream. Exactly one is selected
/// from configuration at startup.
#[async_trait]
pub trait Relay: Send + Sync {
    fn strategy(&self) -> Strategy;
    async fn relay(&self, submission: &Submission) -> Result<RelayOutcome, RelayError>;
}

/// Build the relay for the configured strategy.
pub fn from_config(config: &Config) -> Result<Arc<dyn Relay>, RelayError> {
    let missing = config.missing_settings();
    if !missing.is_empty() {
        return Err(RelayError::NotConfigured(missing));
    }

    let relay: Arc<dyn Relay> = match config.strategy {
        Strategy::Direct | Strategy::Lookup => Arc::new(
            UpsertRelay::new(config).map_err(RelayError::Internal)?,
        ),
        Strategy::Webhook => Arc::new(WebhookRelay::new(config).map_err(RelayError::Internal)?),
    };
    Ok(relay)
}
