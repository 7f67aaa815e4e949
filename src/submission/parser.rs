use axum::http::HeaderMap;
use serde_json::{Map, Value};

use super::Submission;

/// Parse a request body into a submission based on its Content-Type.
/// JSON is assumed when no Content-Type is sent.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Submission, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
        Submission::from_value(value)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart".to_string())
    } else {
        // Try JSON first, then form-urlencoded
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Submission::from_value(value),
            Err(_) => parse_form_urlencoded(body)
                .map_err(|e| format!("Unable to parse body: {e}")),
        }
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Submission, String> {
    std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body) {
        insert_field(&mut map, k.into_owned(), v.into_owned());
    }
    Ok(Submission::new(map))
}

/// Parse multipart form data using multer. File parts contribute their
/// file name, not their contents.
pub async fn parse_multipart(headers: &HeaderMap, body: bytes::Bytes) -> Result<Submission, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut map = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let value = match file_name {
            Some(file_name) => file_name,
            None => field
                .text()
                .await
                .map_err(|e| format!("Field read error: {e}"))?,
        };
        insert_field(&mut map, name, value);
    }

    Ok(Submission::new(map))
}

/// Repeated keys (checkbox groups, multi-selects) collect into an array
/// that stays at the key's first position.
fn insert_field(map: &mut Map<String, Value>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(key, Value::String(value));
        }
    }
}
