use crate::{Payload, payload};
use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Serializes `value` into a JSON response with the given status
pub fn json_response(status: StatusCode, value: &Payload) -> Result<Response<Bytes>, serde_json::Error> {
    let body = payload::to_vec(value)?;
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(response)
}

/// Builds a plain-text response, used for errors the host answers itself
pub fn text_response(status: StatusCode, message: impl Into<String>) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(message.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}
