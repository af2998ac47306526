//! Callable functions
//!
//! A callable is invoked through the platform's RPC transport rather than as a
//! raw HTTP request: the transport unwraps the payload, builds an
//! [`InvocationContext`] and wraps whatever the handler returns.

pub mod context;
pub mod error;
pub mod protocol;


pub use context::InvocationContext;
pub use error::{FunctionsErrorCode, HttpsError};

use crate::Payload;
use async_trait::async_trait;

/// A function reachable through the callable transport
#[async_trait]
pub trait CallableHandler: Send + Sync {
    /// Runs the call. The transport answers only once the returned future
    /// has resolved.
    async fn invoke(
        &self,
        payload: Payload,
        context: InvocationContext,
    ) -> std::result::Result<Payload, HttpsError>;
}
