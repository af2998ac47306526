//! Client side of the function host
//!
//! Used by the `call` and `post` commands and by the integration tests to
//! probe a running host.

pub mod connection;
pub mod config;

pub use connection::FunctionsClient;
pub use config::ClientConfig;
