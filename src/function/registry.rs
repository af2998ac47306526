use super::endpoint::{Callable, Endpoint, HttpHandler, Https};
use crate::callable::CallableHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps function names to endpoints.
///
/// A request is routed by the last segment of its path, so `/echoBody` and
/// `/my-project/us-central1/echoBody` reach the same function.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Endpoint>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, endpoint: impl Endpoint + 'static) -> Self {
        self.functions.insert(name.into(), Arc::new(endpoint));
        self
    }

    /// Registers a handler behind the callable protocol
    pub fn callable(self, name: impl Into<String>, handler: impl CallableHandler + 'static) -> Self {
        self.register(name, Callable::new(handler))
    }

    /// Registers a handler behind plain HTTP
    pub fn https(self, name: impl Into<String>, handler: impl HttpHandler + 'static) -> Self {
        self.register(name, Https::new(handler))
    }

    /// Finds the function a request path addresses
    pub fn resolve(&self, path: &str) -> Option<(&str, Arc<dyn Endpoint>)> {
        let name = function_name(path)?;
        self.functions
            .get_key_value(name)
            .map(|(name, endpoint)| (name.as_str(), endpoint.clone()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn function_name(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next()?;
    path.rsplit('/').find(|segment| !segment.is_empty())
}
