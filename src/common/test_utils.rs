use crate::common::ServerTrait;
use crate::function::FunctionRegistry;
use crate::server::{FunctionServer, ServerConfig};
use crate::{EchoError, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// A function host running on a loopback port for tests
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: JoinHandle<Result<()>>,
    shutdown: broadcast::Sender<()>,
}

impl TestServer {
    /// Signals the server to stop and waits for its accept loop to exit
    pub async fn shutdown(mut self) -> Result<()> {
        // resend until the accept loop has subscribed and seen it
        loop {
            let _ = self.shutdown.send(());
            if let Ok(joined) = timeout(Duration::from_millis(50), &mut self.handle).await {
                return joined.map_err(|e| EchoError::Config(format!("Server task failed: {e}")))?;
            }
        }
    }
}

/// Starts a server for `registry` on an ephemeral loopback port.
///
/// The listener is bound before the server task starts, so the returned
/// address accepts connections immediately.
pub async fn spawn_test_server(mut config: ServerConfig, registry: FunctionRegistry) -> Result<TestServer> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .map_err(|e| EchoError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| EchoError::Config(format!("Failed to get local address: {e}")))?;
    config.bind_addr = addr;

    let server = FunctionServer::new(config, registry);
    let shutdown = server.shutdown_signal();
    let handle = tokio::spawn(async move { server.serve(listener).await });

    Ok(TestServer {
        addr,
        handle,
        shutdown,
    })
}

/// Starts a server with both echo functions and the default configuration
pub async fn spawn_echo_server() -> Result<TestServer> {
    spawn_test_server(ServerConfig::default(), crate::echo::registry()).await
}
