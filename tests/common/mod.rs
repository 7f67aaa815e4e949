use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};

use submission_relay::config::{Config, CrmConfig, Strategy, DEFAULT_NOTE_LABEL};

/// One request received by the mock CRM.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Value,
    pub authorization: Option<String>,
    pub version: Option<String>,
}

/// Canned behaviour of the mock CRM. `None` statuses mean "succeed".
#[derive(Debug, Default)]
pub struct MockCrmState {
    pub calls: Vec<RecordedCall>,
    /// email or phone -> contact id
    pub existing: HashMap<String, String>,
    pub lookup_status: Option<u16>,
    pub create_status: Option<u16>,
    pub create_omits_id: bool,
    pub update_status: Option<u16>,
    pub note_status: Option<u16>,
    pub hook_status: Option<u16>,
    pub next_id: u32,
}

pub struct MockCrm {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<MockCrmState>>,
}

impl MockCrm {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn configure(&self, f: impl FnOnce(&mut MockCrmState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &str, predicate: impl Fn(&str) -> bool) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && predicate(&c.path))
            .collect()
    }

    pub fn lookups(&self) -> Vec<RecordedCall> {
        self.calls_to("GET", |p| p == "/contacts/lookup")
    }

    pub fn creates(&self) -> Vec<RecordedCall> {
        self.calls_to("POST", |p| p == "/contacts/")
    }

    pub fn updates(&self) -> Vec<RecordedCall> {
        self.calls_to("PUT", |p| p.starts_with("/contacts/"))
    }

    pub fn notes(&self) -> Vec<RecordedCall> {
        self.calls_to("POST", |p| p.ends_with("/notes/"))
    }

    pub fn hooks(&self) -> Vec<RecordedCall> {
        self.calls_to("POST", |p| p == "/hook")
    }
}

/// Spawn the mock CRM on a random port.
pub async fn spawn_crm() -> MockCrm {
    let state = Arc::new(Mutex::new(MockCrmState::default()));

    let router = Router::new()
        .fallback(handle_crm)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock CRM");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock CRM failed");
    });

    MockCrm { addr, state }
}

async fn handle_crm(
    State(state): State<Arc<Mutex<MockCrmState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query: HashMap<String, String> = uri
        .query()
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut crm = state.lock().unwrap();
    crm.calls.push(RecordedCall {
        method: method.to_string(),
        path: path.clone(),
        query: query.clone(),
        body: body.clone(),
        authorization: header(&headers, "authorization"),
        version: header(&headers, "version"),
    });

    match (method.as_str(), path.as_str()) {
        ("GET", "/contacts/lookup") => {
            if let Some(status) = crm.lookup_status {
                return reply(status, json!({ "message": "lookup unavailable" }));
            }
            let found = ["email", "phone"]
                .iter()
                .filter_map(|k| query.get(*k))
                .find_map(|v| crm.existing.get(v).cloned());
            match found {
                Some(id) => reply(200, json!({ "contact": { "id": id } })),
                None => reply(404, json!({ "message": "Contact not found" })),
            }
        }
        ("POST", "/contacts/") => {
            if let Some(status) = crm.create_status {
                return reply(status, json!({ "message": "email is invalid" }));
            }
            if crm.create_omits_id {
                return reply(201, json!({ "contact": {} }));
            }
            crm.next_id += 1;
            let id = format!("contact-{}", crm.next_id);
            reply(201, json!({ "contact": { "id": id } }))
        }
        ("PUT", p) if p.starts_with("/contacts/") => {
            if let Some(status) = crm.update_status {
                return reply(status, json!({ "message": "update rejected" }));
            }
            let id = p.trim_start_matches("/contacts/").to_string();
            reply(200, json!({ "contact": { "id": id } }))
        }
        ("POST", p) if p.ends_with("/notes/") => {
            if let Some(status) = crm.note_status {
                return reply(status, json!({ "message": "note service unavailable" }));
            }
            reply(201, json!({ "note": { "id": "note-1" } }))
        }
        ("POST", "/hook") => {
            let status = crm.hook_status.unwrap_or(200);
            (StatusCode::from_u16(status).unwrap(), "hook reply").into_response()
        }
        _ => reply(404, json!({ "message": "no such route" })),
    }
}

fn reply(status: u16, body: Value) -> Response {
    (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Config pointing at the given CRM, lookup strategy, full credentials.
pub fn test_config(crm_url: &str) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        cors_origins: vec![],
        log_level: "warn".to_string(),
        strategy: Strategy::Lookup,
        required_fields: vec![],
        note_label: DEFAULT_NOTE_LABEL.to_string(),
        crm: CrmConfig {
            base_url: crm_url.to_string(),
            api_key: Some("test-key".to_string()),
            location_id: Some("loc-123".to_string()),
            ..CrmConfig::default()
        },
        webhook_url: None,
    }
}

/// A running relay plus the mock CRM it talks to.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub crm: MockCrm,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a JSON body, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submit"))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data, return (body, status).
    pub async fn submit_form(&self, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submit"))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit multipart/form-data, return (body, status).
    pub async fn submit_multipart(&self, parts: &[FormPart<'_>]) -> (Value, StatusCode) {
        let (content_type, body) = multipart_body(parts);
        let resp = self
            .client
            .post(self.url("/api/submit"))
            .header("content-type", content_type)
            .body(body)
            .send()
            .await
            .expect("submit multipart failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_json(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// One multipart part; `file_name` makes it a file upload.
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub value: &'a str,
}

pub const MULTIPART_BOUNDARY: &str = "relay-test-boundary";

/// Encode parts as a multipart/form-data body, returning (content type, body).
pub fn multipart_body(parts: &[FormPart<'_>]) -> (String, String) {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{MULTIPART_BOUNDARY}\r\n"));
        match part.file_name {
            Some(file_name) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n",
                    part.name
                ));
                body.push_str("Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n",
                    part.name
                ));
            }
        }
        body.push_str("\r\n");
        body.push_str(part.value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));

    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}

/// Spawn a relay with the default test config.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn a relay after letting the caller adjust its config.
pub async fn spawn_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let crm = spawn_crm().await;

    let mut config = test_config(&crm.url());
    adjust(&mut config);

    let (app, _state) = submission_relay::build_app(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        crm,
    }
}
