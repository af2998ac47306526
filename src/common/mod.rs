//! Common traits and helpers used across the echobody library
//!
//! This module contains the server lifecycle trait and the helpers the tests
//! use to stand up a function host on a loopback port.

pub mod test_utils;
pub mod traits;

pub use test_utils::{TestServer, spawn_echo_server, spawn_test_server};
pub use traits::ServerTrait;
