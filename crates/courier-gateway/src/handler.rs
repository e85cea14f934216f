//! Typed handler method tables.
//!
//! A [`Handler`] is a named registry of method closures keyed by formatted
//! signature (`name(Type,Type)`). Methods are bound at registration time, so
//! terminal dispatch is a plain map lookup with no runtime type inspection;
//! an unknown signature surfaces as `MethodNotFound` at the invoker.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use courier_protocol::MethodSignature;

/// Application-level failure raised by a handler's own logic.
///
/// Faults are tunnelled through the response payload rather than surfacing
/// as transport errors, so the caller can tell "the call reached the handler
/// and it failed" from "the call never reached the handler".
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
}

impl HandlerFault {
    /// Creates a fault with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The fault description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A registered method body.
pub type MethodFn = Box<dyn Fn(&[Value]) -> Result<Value, HandlerFault> + Send + Sync>;

/// Error raised when a signature is registered twice on one handler.
#[derive(Debug, Error)]
#[error("method '{signature}' is already registered on handler '{handler}'")]
pub struct DuplicateMethod {
    /// Formatted signature that collided.
    pub signature: String,
    /// Handler the registration was attempted on.
    pub handler: String,
}

/// A live invocation target: a name plus its typed method table.
pub struct Handler {
    name: String,
    methods: HashMap<String, MethodFn>,
}

impl Handler {
    /// Creates a handler with an empty method table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// The handler's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds a method body to a signature.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateMethod`] if the signature is already bound.
    pub fn register<F>(
        &mut self,
        signature: &MethodSignature,
        body: F,
    ) -> Result<(), DuplicateMethod>
    where
        F: Fn(&[Value]) -> Result<Value, HandlerFault> + Send + Sync + 'static,
    {
        let key = signature.to_string();
        if self.methods.contains_key(&key) {
            return Err(DuplicateMethod {
                signature: key,
                handler: self.name.clone(),
            });
        }
        self.methods.insert(key, Box::new(body));
        Ok(())
    }

    /// Looks up the method bound to a signature.
    #[must_use]
    pub fn resolve(&self, signature: &MethodSignature) -> Option<&MethodFn> {
        self.methods.get(&signature.to_string())
    }

    /// Number of registered methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Handler")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
