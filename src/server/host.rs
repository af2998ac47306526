use super::ServerConfig;
use crate::common::ServerTrait;
use crate::function::FunctionRegistry;
use crate::http::{HttpError, RequestCodec, text_response, wants_close};
use crate::{EchoError, Result};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::{HeaderValue, Response, StatusCode, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::{signal, time::timeout};
use tokio_util::codec::Framed;
use tracing::{Instrument, error, info, warn};

/// Hosts a set of functions over HTTP/1.1
///
/// # Examples
///
/// ```no_run
/// use echobody::{FunctionServer, ServerConfig, ServerTrait};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = FunctionServer::new(ServerConfig::default(), echobody::echo::registry());
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct FunctionServer {
    config: ServerConfig,
    registry: Arc<FunctionRegistry>,
    shutdown_signal: Arc<broadcast::Sender<()>>,
}

impl FunctionServer {
    pub fn new(config: ServerConfig, registry: FunctionRegistry) -> Self {
        let (shutdown_signal, _) = broadcast::channel(1);
        Self {
            config,
            registry: Arc::new(registry),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Binds the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.config.bind_addr).await?)
    }

    /// Accepts connections on `listener` until a shutdown signal arrives
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let functions: Vec<&str> = self.registry.names().collect();
        info!(address = %local_addr, ?functions, "Function server listening");

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            info!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let registry = self.registry.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);

                            tokio::spawn(async move {
                                let result = handle_connection(stream, addr, registry, config).instrument(span).await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Function server stopped");
        Ok(())
    }
}

impl ServerTrait for FunctionServer {
    async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

/// Serves requests on one connection until the peer closes it, asks for it to
/// be closed, or a timeout expires.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<FunctionRegistry>,
    config: ServerConfig,
) -> Result<()> {
    let mut framed = Framed::new(stream, RequestCodec::new(config.max_body_size));

    loop {
        let request = match timeout(config.read_timeout, framed.next()).await {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => {
                if !matches!(e, HttpError::Io(_)) {
                    warn!(%addr, error = %e, "Rejecting malformed request");
                    let response = finish(text_response(e.status(), e.to_string()), &config, true);
                    // the peer may already be gone
                    let _ = timeout(config.write_timeout, framed.send(response)).await;
                }
                return Err(EchoError::Http(e));
            }
            Ok(None) => {
                info!(%addr, "Client closed connection");
                break;
            }
            Err(_) => {
                warn!(%addr, "Read timeout");
                break;
            }
        };

        let close = wants_close(request.version(), request.headers());
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        info!(%addr, %method, %path, size = request.body().len(), "Received request");

        let response = match registry.resolve(&path) {
            Some((name, endpoint)) => {
                let span = tracing::info_span!("function", name);
                let response = endpoint.serve(request, Some(addr)).instrument(span).await;
                info!(%addr, function = name, status = response.status().as_u16(), "Served request");
                response
            }
            None => {
                warn!(%addr, %path, "No function at path");
                text_response(StatusCode::NOT_FOUND, "Not Found")
            }
        };

        let response = finish(response, &config, close);
        match timeout(config.write_timeout, framed.send(response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(EchoError::Http(e)),
            Err(_) => {
                warn!(%addr, "Write timeout");
                break;
            }
        }

        if close {
            break;
        }
    }

    Ok(())
}

fn finish(mut response: Response<Bytes>, config: &ServerConfig, close: bool) -> Response<Bytes> {
    let headers = response.headers_mut();
    if let Some(name) = config.server_name.as_deref() {
        if let Ok(value) = HeaderValue::from_str(name) {
            headers.insert(header::SERVER, value);
        }
    }
    if close {
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}
