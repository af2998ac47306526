use crate::callable::FunctionsErrorCode;
use crate::http::HttpError;
use thiserror::Error;

/// Error types for the echobody library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Socket-level errors (bind, accept, connect, read, write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP framing errors on either side of a connection
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A callable function answered with an error envelope
    #[error("Callable error {status}: {message}")]
    Callable {
        status: FunctionsErrorCode,
        message: String,
        details: Option<Payload>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),
}

/// Result type for the echobody library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod callable;
pub mod client;
pub mod common;
pub mod echo;
pub mod function;
pub mod http;
pub mod payload;
pub mod server;

// Re-export main types for convenience
pub use callable::{CallableHandler, HttpsError, InvocationContext};
pub use client::{ClientConfig, FunctionsClient};
pub use common::ServerTrait;
pub use echo::{CallableEcho, HttpEcho};
pub use function::{Endpoint, FunctionRegistry, HttpHandler};
pub use server::{FunctionServer, ServerConfig};

/// An opaque structured value passed through a function unchanged.
pub type Payload = serde_json::Value;

/// Name of the callable echo function.
pub const CALLABLE_ECHO_NAME: &str = "echoBody";

/// Name of the plain HTTP echo function.
pub const HTTP_ECHO_NAME: &str = "echoBodyHttp";
