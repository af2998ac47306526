//! Wire envelope of the callable protocol.
//!
//! A call is a `POST` with a JSON body `{"data": <payload>}`. A successful
//! call answers `{"result": <payload>}`, a failed one answers an error
//! envelope (see [`HttpsError`]).

use super::{FunctionsErrorCode, HttpsError};
use crate::{Payload, payload};
use crate::http::{json_response, media_type, text_response};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use serde_json::{Map, Value};

pub const ALLOWED_HEADERS: &str =
    "authorization, content-type, firebase-instance-id-token, x-firebase-appcheck";
pub const PREFLIGHT_MAX_AGE: &str = "3600";

/// Extracts the payload of a call, or the error to answer with
pub fn decode_call(request: &Request<Bytes>) -> Result<Payload, HttpsError> {
    if *request.method() != Method::POST {
        return Err(HttpsError::bad_request());
    }
    if media_type(request.headers()).as_deref() != Some("application/json") {
        return Err(HttpsError::bad_request());
    }

    match payload::from_slice(request.body()) {
        Ok(Value::Object(mut envelope)) => envelope.remove("data").ok_or_else(HttpsError::bad_request),
        _ => Err(HttpsError::bad_request()),
    }
}

/// Wraps a call's payload in the request envelope
pub fn encode_call(payload: Payload) -> Payload {
    let mut envelope = Map::new();
    envelope.insert("data".to_string(), payload);
    Value::Object(envelope)
}

pub fn encode_result(payload: Payload) -> Response<Bytes> {
    let mut envelope = Map::new();
    envelope.insert("result".to_string(), payload);
    json_or_internal(StatusCode::OK, &Value::Object(envelope))
}

pub fn encode_error(error: &HttpsError) -> Response<Bytes> {
    json_or_internal(error.code.http_status(), &error.to_envelope())
}

/// Answer to a CORS preflight request
pub fn preflight(headers: &HeaderMap) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let h = response.headers_mut();
    h.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST"),
    );
    h.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    h.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    with_cors(response, headers)
}

/// Reflects the caller's `Origin`, or allows any origin when there is none
pub fn with_cors(mut response: Response<Bytes>, request_headers: &HeaderMap) -> Response<Bytes> {
    let origin = request_headers
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    let h = response.headers_mut();
    h.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    h.insert(header::VARY, HeaderValue::from_static("Origin"));
    response
}

/// Reads a call's answer back into a payload or the error it carries
pub fn decode_answer(status: StatusCode, body: &[u8]) -> Result<Payload, HttpsError> {
    let value = payload::from_slice(body).map_err(|_| {
        HttpsError::new(
            FunctionsErrorCode::Internal,
            format!("Response is not valid JSON object (status {status})"),
        )
    })?;

    let Value::Object(mut envelope) = value else {
        return Err(HttpsError::new(
            FunctionsErrorCode::Internal,
            "Response is not valid JSON object.",
        ));
    };

    if let Some(error) = envelope.remove("error") {
        return Err(error_from_envelope(error, status));
    }
    if !status.is_success() {
        return Err(HttpsError::new(
            FunctionsErrorCode::Internal,
            format!("Unexpected status {status}"),
        ));
    }

    envelope.remove("result").ok_or_else(|| {
        HttpsError::new(
            FunctionsErrorCode::Internal,
            "Response is missing data field.",
        )
    })
}

fn error_from_envelope(error: Value, status: StatusCode) -> HttpsError {
    let code = error
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value(s).ok())
        .unwrap_or(FunctionsErrorCode::Internal);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Call failed with status {status}"));
    let mut decoded = HttpsError::new(code, message);
    if let Some(details) = error.get("details") {
        decoded = decoded.with_details(details.clone());
    }
    decoded
}

fn json_or_internal(status: StatusCode, value: &Payload) -> Response<Bytes> {
    json_response(status, value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize callable response");
        text_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
    })
}
