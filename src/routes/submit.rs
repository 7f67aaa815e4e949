use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::error::RelayError;
use crate::state::SharedState;
use crate::submission::{parser, validate};

pub async fn submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let Some(relay) = state.relay.as_ref() else {
        let missing = state.config.missing_settings();
        if missing.is_empty() {
            return Err(RelayError::Internal("relay failed to initialise".to_string()));
        }
        return Err(RelayError::NotConfigured(missing));
    };

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let submission = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body)
            .await
            .map_err(RelayError::Validation)?
    } else {
        parser::parse_body(content_type, &body).map_err(RelayError::Validation)?
    };

    let problems = validate::missing_required(&submission, &state.config.required_fields);
    if !problems.is_empty() {
        return Err(RelayError::Validation(problems.join("; ")));
    }

    tracing::info!(
        fields = submission.len(),
        strategy = relay.strategy().as_str(),
        "Submission received"
    );

    let outcome = relay.relay(&submission).await?;

    if outcome.note_warning.is_some() {
        tracing::warn!(contact_id = ?outcome.contact_id, "Submission completed with note warning");
    }

    Ok((outcome.status_code(), Json(outcome.to_json())).into_response())
}

/// Reports whether the selected strategy has everything it needs.
pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let missing = state.config.missing_settings();
    Json(json!({
        "configured": missing.is_empty() && state.relay.is_some(),
        "strategy": state.config.strategy.as_str(),
        "missing": missing,
    }))
}
