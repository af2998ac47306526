//! The function host
//!
//! Accepts TCP connections, frames HTTP/1.1 requests on them and hands each
//! request to the function its path names.

pub mod config;
pub mod host;


pub use config::ServerConfig;
pub use host::FunctionServer;
