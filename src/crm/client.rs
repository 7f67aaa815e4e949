use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::config::CrmConfig;

use super::types::{extract_contact_id, ContactDraft, ContactPatch, NoteBody};
use super::CrmError;

/// Thin client over the CRM contact and notes endpoints. Every call is
/// attempted exactly once.
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    location_id: String,
    api_version: String,
}

impl CrmClient {
    pub fn new(config: &CrmConfig) -> Result<Self, String> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| "CRM_API_KEY is not configured".to_string())?;
        let location_id = config
            .location_id
            .clone()
            .ok_or_else(|| "CRM_LOCATION_ID is not configured".to_string())?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("submission-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            location_id,
            api_version: config.api_version.clone(),
        })
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .header("Accept", "application/json")
    }

    /// `GET /contacts/lookup`. Returns `None` without calling out when both
    /// keys are empty, and on 404.
    pub async fn find_contact(&self, email: &str, phone: &str) -> Result<Option<String>, CrmError> {
        if email.is_empty() && phone.is_empty() {
            return Ok(None);
        }

        let mut query: Vec<(&str, &str)> = vec![("locationId", self.location_id.as_str())];
        if !email.is_empty() {
            query.push(("email", email));
        }
        if !phone.is_empty() {
            query.push(("phone", phone));
        }

        let resp = self
            .request(Method::GET, "/contacts/lookup")
            .query(&query)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = success_body(resp).await?;
        Ok(extract_contact_id(&body))
    }

    /// `POST /contacts/`, returning the id the CRM assigned.
    pub async fn create_contact(&self, draft: &ContactDraft) -> Result<String, CrmError> {
        let resp = self
            .request(Method::POST, "/contacts/")
            .json(draft)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        let body = success_body(resp).await?;
        extract_contact_id(&body).ok_or(CrmError::MissingId)
    }

    /// `PUT /contacts/{id}` with only the populated fields.
    pub async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<(), CrmError> {
        let resp = self
            .request(Method::PUT, &format!("/contacts/{id}"))
            .json(patch)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        success_body(resp).await.map(|_| ())
    }

    /// `POST /contacts/{id}/notes/`.
    pub async fn create_note(&self, id: &str, body: &str) -> Result<(), CrmError> {
        let resp = self
            .request(Method::POST, &format!("/contacts/{id}/notes/"))
            .json(&NoteBody { body })
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        success_body(resp).await.map(|_| ())
    }
}

/// Read the body, failing with `CrmError::Status` on a non-2xx reply.
async fn success_body(resp: Response) -> Result<Value, CrmError> {
    let status = resp.status();
    let body = read_body(resp).await;

    if status.is_success() {
        Ok(body)
    } else {
        Err(CrmError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// JSON when the body parses, otherwise the first 1024 chars as a string.
pub(crate) async fn read_body(resp: Response) -> Value {
    let text = resp.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text)
        .unwrap_or_else(|_| Value::String(text.chars().take(1024).collect()))
}
