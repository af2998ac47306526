use super::media_type;
use crate::{Payload, payload};
use http::HeaderMap;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("text body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

/// Parses a raw request body into a payload, the way the platform ingress
/// does before an HTTP function runs.
///
/// An empty body, or one whose media type no parser handles, becomes `{}`.
pub fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Payload, BodyError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let Some(media_type) = media_type(headers) else {
        return Ok(Value::Object(Map::new()));
    };

    if media_type == "application/json" || media_type.ends_with("+json") {
        Ok(payload::from_slice(body)?)
    } else if media_type.starts_with("text/") {
        Ok(Value::String(std::str::from_utf8(body)?.to_string()))
    } else if media_type == "application/x-www-form-urlencoded" {
        parse_form(body)
    } else {
        Ok(Value::Object(Map::new()))
    }
}

fn parse_form(body: &[u8]) -> Result<Payload, BodyError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
    let mut fields = Map::new();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                fields.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(fields))
}
