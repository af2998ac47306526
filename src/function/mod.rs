//! Function endpoints and routing
//!
//! Handlers are written against [`CallableHandler`](crate::callable::CallableHandler)
//! or [`HttpHandler`]; the adapters here turn them into [`Endpoint`]s the host
//! can serve, and [`FunctionRegistry`] routes requests to them by name.

pub mod endpoint;
pub mod registry;

#[cfg(test)]
mod tests;

pub use endpoint::{Callable, Endpoint, HttpHandler, Https};
pub use registry::FunctionRegistry;
