use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Configuration for the function host
///
/// # Examples
///
/// ```rust
/// use echobody::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     max_connections: 100,
///     max_body_size: 1024 * 1024,
///     read_timeout: Duration::from_secs(30),
///     write_timeout: Duration::from_secs(30),
///     server_name: Some("echobody".to_string()),
/// };
/// ```
///
/// Using the default configuration:
///
/// ```
/// use echobody::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.max_body_size, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Largest request body accepted, in bytes
    pub max_body_size: usize,
    /// How long to wait for the next request on a connection
    pub read_timeout: Duration,
    /// How long writing a response may take
    pub write_timeout: Duration,
    /// Value of the `Server` response header (optional)
    pub server_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1000,
            max_body_size: 10 * 1024 * 1024,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: Some(format!("echobody/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}
