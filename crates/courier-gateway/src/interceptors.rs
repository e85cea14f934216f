//! Interceptor registry and built-in interceptors.
//!
//! Configuration names interceptors by string; the registry maps those names
//! to live instances when a gateway is built. Duplicate registrations for
//! the same name are rejected.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chain::{ChainLink, Interceptor};
use crate::invocation::Invocation;
use crate::invoker::InvokeError;

/// Tracing target for interceptor execution.
pub(crate) const CHAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::chain");

/// Errors raised by interceptor registry operations.
#[derive(Debug, Error)]
pub enum InterceptorRegistryError {
    /// An interceptor with the same name is already registered.
    #[error("interceptor '{name}' is already registered")]
    Duplicate {
        /// Name that collided.
        name: String,
    },

    /// A configured name does not match any registered interceptor.
    #[error("interceptor '{name}' not found in registry")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },
}

/// Registry of available interceptors, keyed by name.
#[derive(Default)]
pub struct InterceptorRegistry {
    interceptors: HashMap<String, Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in interceptors.
    #[must_use]
    pub fn with_builtins() -> Self {
        let trace: Arc<dyn Interceptor> = Arc::new(TraceInterceptor::new());
        Self {
            interceptors: HashMap::from([(TraceInterceptor::NAME.to_owned(), trace)]),
        }
    }

    /// Registers an interceptor under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorRegistryError::Duplicate`] when the name is
    /// taken.
    pub fn register(
        &mut self,
        interceptor: Arc<dyn Interceptor>,
    ) -> Result<(), InterceptorRegistryError> {
        let name = interceptor.name().to_owned();
        if self.interceptors.contains_key(&name) {
            return Err(InterceptorRegistryError::Duplicate { name });
        }
        self.interceptors.insert(name, interceptor);
        Ok(())
    }

    /// Looks up an interceptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Interceptor>> {
        self.interceptors.get(name).map(Arc::clone)
    }

    /// Resolves an ordered list of configured names into instances.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorRegistryError::NotFound`] for the first name
    /// with no registered interceptor.
    pub fn resolve_list(
        &self,
        names: &[String],
    ) -> Result<Vec<Arc<dyn Interceptor>>, InterceptorRegistryError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| InterceptorRegistryError::NotFound { name: name.clone() })
            })
            .collect()
    }
}

/// Built-in interceptor that logs entry and outcome around delegation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceInterceptor;

impl TraceInterceptor {
    /// Registry name of the trace interceptor.
    pub const NAME: &'static str = "trace";

    /// Creates the trace interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for TraceInterceptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn intercept(
        &self,
        invocation: &mut Invocation,
        next: ChainLink<'_>,
    ) -> Result<Value, InvokeError> {
        debug!(
            target: CHAIN_TARGET,
            target_id = invocation.target(),
            signature = %invocation.signature(),
            position = next.position(),
            "invoking"
        );
        let outcome = next.proceed(invocation);
        match &outcome {
            Ok(_) => debug!(
                target: CHAIN_TARGET,
                target_id = invocation.target(),
                signature = %invocation.signature(),
                "invocation succeeded"
            ),
            Err(error) => warn!(
                target: CHAIN_TARGET,
                target_id = invocation.target(),
                signature = %invocation.signature(),
                %error,
                "invocation failed"
            ),
        }
        outcome
    }
}
