use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

/// Which upstream call aborted the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStep {
    Create,
    Update,
    Forward,
}

impl UpstreamStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamStep::Create => "create",
            UpstreamStep::Update => "update",
            UpstreamStep::Forward => "forward",
        }
    }
}

#[derive(Debug)]
pub enum RelayError {
    /// The submission is unusable: not an object, or a required key is blank.
    Validation(String),
    /// A contact create/update (or webhook forward) did not succeed.
    Upstream {
        step: UpstreamStep,
        status: Option<u16>,
        detail: Value,
    },
    /// Credentials or target URL are missing for the selected strategy.
    NotConfigured(Vec<&'static str>),
    Internal(String),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Validation(msg) => write!(f, "Validation Error: {msg}"),
            RelayError::Upstream {
                step,
                status: Some(status),
                ..
            } => write!(f, "Upstream Error: {} returned {status}", step.as_str()),
            RelayError::Upstream { step, detail, .. } => {
                write!(f, "Upstream Error: {} failed: {detail}", step.as_str())
            }
            RelayError::NotConfigured(missing) => {
                write!(f, "Not Configured: missing {}", missing.join(", "))
            }
            RelayError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            RelayError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
            RelayError::Upstream {
                step,
                status,
                detail,
            } => {
                tracing::error!(step = step.as_str(), status = ?status, "Upstream call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "success": false,
                        "step": step.as_str(),
                        "error": detail,
                    }),
                )
            }
            RelayError::NotConfigured(missing) => {
                tracing::error!("Relay is not configured, missing {}", missing.join(", "));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "error": "Relay is not configured",
                        "missing": missing,
                    }),
                )
            }
            RelayError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
