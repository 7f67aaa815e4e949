pub mod client;
pub mod types;

use serde_json::{json, Value};

pub use client::CrmClient;

/// Failure of a single CRM call.
#[derive(Debug)]
pub enum CrmError {
    /// The request never produced a response.
    Transport(String),
    /// The CRM answered with a non-success status.
    Status { status: u16, body: Value },
    /// A create succeeded but the reply carried no contact id.
    MissingId,
}

impl std::fmt::Display for CrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrmError::Transport(msg) => write!(f, "CRM request failed: {msg}"),
            CrmError::Status { status, .. } => write!(f, "CRM responded with status {status}"),
            CrmError::MissingId => write!(f, "CRM response did not include a contact id"),
        }
    }
}

impl CrmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CrmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// JSON detail handed back to the caller: the CRM's own body when it
    /// sent one, otherwise a short error object.
    pub fn detail(&self) -> Value {
        match self {
            CrmError::Status { status, body } if body.is_null() => json!({ "status": status }),
            CrmError::Status { body, .. } => body.clone(),
            other => json!({ "error": other.to_string() }),
        }
    }
}
