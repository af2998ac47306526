use crate::{Payload, payload};
use crate::callable::{CallableHandler, InvocationContext, protocol};
use crate::http::{parse_body, text_response};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Request, Response, StatusCode, header};
use std::net::SocketAddr;
use tracing::{debug, warn};

use crate::http::response::JSON_CONTENT_TYPE;

/// A deployed function as the host sees it: raw request in, raw response out
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn serve(&self, request: Request<Bytes>, remote_addr: Option<SocketAddr>) -> Response<Bytes>;
}

/// A function invoked with a plain HTTP request whose body the ingress layer
/// has already parsed.
#[async_trait]
pub trait HttpHandler: Send + Sync {
    async fn handle(&self, request: Request<Payload>) -> Response<Payload>;
}

/// Exposes a [`CallableHandler`] over the callable protocol
pub struct Callable<H> {
    handler: H,
}

impl<H: CallableHandler> Callable<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H: CallableHandler> Endpoint for Callable<H> {
    async fn serve(&self, request: Request<Bytes>, remote_addr: Option<SocketAddr>) -> Response<Bytes> {
        if *request.method() == Method::OPTIONS {
            return protocol::preflight(request.headers());
        }

        let payload = match protocol::decode_call(&request) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(method = %request.method(), error = %e, "Invalid callable request");
                return protocol::with_cors(protocol::encode_error(&e), request.headers());
            }
        };

        let (parts, _) = request.into_parts();
        let context = InvocationContext::from_parts(&parts, remote_addr);
        let response = match self.handler.invoke(payload, context).await {
            Ok(result) => protocol::encode_result(result),
            Err(e) => {
                debug!(code = %e.code, message = %e.message, "Callable returned an error");
                protocol::encode_error(&e)
            }
        };
        protocol::with_cors(response, &parts.headers)
    }
}

/// Exposes an [`HttpHandler`] behind the ingress body parser
pub struct Https<H> {
    handler: H,
}

impl<H: HttpHandler> Https<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H: HttpHandler> Endpoint for Https<H> {
    async fn serve(&self, request: Request<Bytes>, _remote_addr: Option<SocketAddr>) -> Response<Bytes> {
        let (parts, raw) = request.into_parts();
        let body = match parse_body(&parts.headers, &raw) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Rejected unparseable request body");
                return text_response(StatusCode::BAD_REQUEST, e.to_string());
            }
        };

        let response = self.handler.handle(Request::from_parts(parts, body)).await;
        let (parts, body) = response.into_parts();
        let bytes = match payload::to_vec(&body) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to serialize response body");
                return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        };

        let mut out = Response::from_parts(parts, Bytes::from(bytes));
        out.headers_mut()
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON_CONTENT_TYPE));
        out
    }
}
