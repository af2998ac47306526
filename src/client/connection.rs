use super::ClientConfig;
use crate::callable::protocol;
use crate::http::{HttpError, ResponseCodec};
use crate::{EchoError, Payload, Result, payload};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tokio_util::codec::Framed;
use tracing::debug;

/// Client for a function host, holding one persistent connection.
///
/// # Examples
///
/// ```no_run
/// use echobody::FunctionsClient;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:8080".parse()?;
///     let mut client = FunctionsClient::connect(addr).await?;
///
///     let result = client.call("echoBody", json!({"x": 1})).await?;
///     println!("Function returned: {result}");
///     Ok(())
/// }
/// ```
pub struct FunctionsClient {
    framed: Framed<TcpStream, ResponseCodec>,
    addr: SocketAddr,
    config: ClientConfig,
    last_activity: Instant,
}

impl FunctionsClient {
    /// Connect to a host with custom configuration
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;

        Ok(Self {
            framed: Framed::new(stream, ResponseCodec::new(config.max_response_size)),
            addr,
            config,
            last_activity: Instant::now(),
        })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Check if the client has been idle for too long
    pub fn is_idle(&self, max_idle: Duration) -> bool {
        self.last_activity.elapsed() > max_idle
    }

    /// Sends one request and waits for its response
    pub async fn send(&mut self, mut request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.last_activity = Instant::now();
        if let Ok(host) = HeaderValue::from_str(&self.addr.to_string()) {
            request.headers_mut().entry(header::HOST).or_insert(host);
        }

        timeout(self.config.write_timeout, self.framed.send(request))
            .await
            .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;

        let response = timeout(self.config.read_timeout, self.framed.next())
            .await
            .map_err(|_| EchoError::Timeout("Read timeout".to_string()))?
            .ok_or(EchoError::Http(HttpError::IncompleteMessage))??;

        self.last_activity = Instant::now();
        debug!(addr = %self.addr, status = response.status().as_u16(), size = response.body().len(), "Received response");
        Ok(response)
    }

    /// Sends a request with `body` to the function called `name`
    pub async fn request(
        &mut self,
        method: Method,
        name: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>> {
        let mut builder = Request::builder().method(method).uri(format!("/{name}"));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder
            .body(body)
            .map_err(|e| EchoError::Config(format!("Invalid request for {name}: {e}")))?;
        self.send(request).await
    }

    /// Invokes a callable function and returns its result
    pub async fn call(&mut self, name: &str, payload: Payload) -> Result<Payload> {
        self.call_with_headers(name, payload, HeaderMap::new()).await
    }

    /// Invokes a callable function, sending extra headers such as an
    /// `Authorization` bearer token
    pub async fn call_with_headers(
        &mut self,
        name: &str,
        payload: Payload,
        headers: HeaderMap,
    ) -> Result<Payload> {
        let body = payload::to_vec(&protocol::encode_call(payload))?;
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(format!("/{name}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))
            .map_err(|e| EchoError::Config(format!("Invalid request for {name}: {e}")))?;
        request.headers_mut().extend(headers);

        let response = self.send(request).await?;
        protocol::decode_answer(response.status(), response.body()).map_err(|e| EchoError::Callable {
            status: e.code,
            message: e.message,
            details: e.details,
        })
    }

    /// POSTs a JSON body to an HTTP function.
    ///
    /// A response body that is not JSON comes back as a JSON string.
    pub async fn post_json(&mut self, name: &str, body: &Payload) -> Result<(StatusCode, Payload)> {
        let bytes = Bytes::from(payload::to_vec(body)?);
        let response = self
            .request(Method::POST, name, Some("application/json"), bytes)
            .await?;
        let status = response.status();
        let body = response.into_body();
        let value = payload::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
        Ok((status, value))
    }
}
