//! HTTP/1.1 plumbing for the function host
//!
//! This module frames requests and responses on a byte stream, parses request
//! bodies the way the platform ingress does, and builds the small set of
//! responses the host produces on its own.

pub mod body;
pub mod codec;
pub mod response;


pub use body::{BodyError, parse_body};
pub use codec::{RequestCodec, ResponseCodec};
pub use response::{json_response, text_response};

use ::http::{HeaderMap, StatusCode, Version, header};
use std::io;

/// Upper bound on the size of a request or response head
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Maximum number of headers accepted in a single message
pub const MAX_HEADERS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Body exceeds limit of {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("Incomplete message")]
    IncompleteMessage,
}

impl HttpError {
    /// Status code the server answers with before closing the connection
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::Io(_) | HttpError::IncompleteMessage => StatusCode::BAD_REQUEST,
            HttpError::HttpParse(_) | HttpError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Returns true when the connection must be closed after answering a request
/// with these headers.
pub fn wants_close(version: Version, headers: &HeaderMap) -> bool {
    let mut close = false;
    let mut keep_alive = false;
    for value in headers.get_all(header::CONNECTION) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for token in value.split(',').map(str::trim) {
            if token.eq_ignore_ascii_case("close") {
                close = true;
            } else if token.eq_ignore_ascii_case("keep-alive") {
                keep_alive = true;
            }
        }
    }

    close || (version == Version::HTTP_10 && !keep_alive)
}

/// Lower-cased media type of the `Content-Type` header, parameters stripped
pub fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}
