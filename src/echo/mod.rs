//! The echo probes
//!
//! Two stateless functions used to check that a client can reach the
//! function host: [`CallableEcho`] returns a call's payload as its result and
//! [`HttpEcho`] answers an HTTP request with its own parsed body.

use crate::callable::{CallableHandler, HttpsError, InvocationContext};
use crate::function::{FunctionRegistry, HttpHandler};
use crate::{CALLABLE_ECHO_NAME, HTTP_ECHO_NAME, Payload};
use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use tracing::debug;

#[cfg(test)]
mod tests;

/// Returns the payload of a call unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct CallableEcho;

impl CallableEcho {
    /// The context is accepted and left untouched.
    pub async fn invoke(&self, payload: Payload, _context: InvocationContext) -> Payload {
        payload
    }
}

#[async_trait]
impl CallableHandler for CallableEcho {
    async fn invoke(
        &self,
        payload: Payload,
        context: InvocationContext,
    ) -> std::result::Result<Payload, HttpsError> {
        debug!(remote = ?context.remote_addr, "Echoing callable payload");
        Ok(CallableEcho::invoke(self, payload, context).await)
    }
}

/// Answers with status 200 and the request's parsed body
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpEcho;

impl HttpEcho {
    pub async fn handle(&self, request: Request<Payload>) -> Response<Payload> {
        let mut response = Response::new(request.into_body());
        *response.status_mut() = StatusCode::OK;
        response
    }
}

#[async_trait]
impl HttpHandler for HttpEcho {
    async fn handle(&self, request: Request<Payload>) -> Response<Payload> {
        debug!(method = %request.method(), uri = %request.uri(), "Echoing request body");
        HttpEcho::handle(self, request).await
    }
}

/// A registry with both probes: the callable under `echoBody` and the HTTP
/// variant under `echoBodyHttp`.
pub fn registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .callable(CALLABLE_ECHO_NAME, CallableEcho)
        .https(HTTP_ECHO_NAME, HttpEcho)
}
