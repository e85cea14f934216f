//! Terminal invocation strategies.
//!
//! The [`Invoker`] trait is the seam behind which the terminal call is made,
//! so hosts can substitute alternate dispatch strategies; the default
//! [`RegistryInvoker`] resolves the method against the handler's typed
//! method table.

use serde_json::Value;
use thiserror::Error;

use courier_protocol::MethodSignature;

use crate::handler::{Handler, HandlerFault};

/// Errors surfaced while a chain executes.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The signature could not be resolved on the handler.
    #[error("handler '{handler}' has no method '{signature}'")]
    MethodNotFound {
        /// Handler the lookup ran against.
        handler: String,
        /// Formatted signature that missed.
        signature: String,
    },

    /// The handler's own logic raised a failure.
    #[error("handler raised a failure: {0}")]
    Handler(#[from] HandlerFault),

    /// Delegation was attempted past the end of the chain.
    #[error("interceptor chain exhausted at position {position} (length {length})")]
    ChainExhausted {
        /// Cursor position of the rejected delegation.
        position: usize,
        /// Number of interceptors in the chain.
        length: usize,
    },
}

/// Performs the terminal call against the resolved handler.
pub trait Invoker: Send + Sync {
    /// Dispatches the method on the handler.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::MethodNotFound`] when the signature cannot be
    /// resolved on the handler and [`InvokeError::Handler`] when the
    /// handler's own logic raises a failure.
    fn invoke(
        &self,
        handler: &Handler,
        signature: &MethodSignature,
        arguments: &[Value],
    ) -> Result<Value, InvokeError>;
}

/// Default invoker: typed method-table lookup by formatted signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryInvoker;

impl RegistryInvoker {
    /// Creates the default invoker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Invoker for RegistryInvoker {
    fn invoke(
        &self,
        handler: &Handler,
        signature: &MethodSignature,
        arguments: &[Value],
    ) -> Result<Value, InvokeError> {
        let method = handler
            .resolve(signature)
            .ok_or_else(|| InvokeError::MethodNotFound {
                handler: handler.name().to_owned(),
                signature: signature.to_string(),
            })?;
        Ok(method(arguments)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn echo_handler() -> Handler {
        let mut handler = Handler::new("svc1");
        handler
            .register(&MethodSignature::new("echo", ["String"]), |args| {
                Ok(args.first().cloned().unwrap_or(Value::Null))
            })
            .expect("register echo");
        handler
            .register(&MethodSignature::nullary("fail"), |_| {
                Err(HandlerFault::new("deliberate failure"))
            })
            .expect("register fail");
        handler
    }

    #[test]
    fn dispatches_registered_method() {
        let handler = echo_handler();
        let result = RegistryInvoker::new()
            .invoke(
                &handler,
                &MethodSignature::new("echo", ["String"]),
                &[json!("hi")],
            )
            .expect("invoke");
        assert_eq!(result, json!("hi"));
    }

    #[test]
    fn unresolved_signature_is_method_not_found() {
        let handler = echo_handler();
        let error = RegistryInvoker::new()
            .invoke(&handler, &MethodSignature::new("echo", ["i64"]), &[])
            .expect_err("missing method");
        assert!(matches!(
            error,
            InvokeError::MethodNotFound { handler, signature }
                if handler == "svc1" && signature == "echo(i64)"
        ));
    }

    #[test]
    fn handler_failure_is_wrapped() {
        let handler = echo_handler();
        let error = RegistryInvoker::new()
            .invoke(&handler, &MethodSignature::nullary("fail"), &[])
            .expect_err("handler fault");
        assert!(matches!(error, InvokeError::Handler(_)));
        assert!(error.to_string().contains("deliberate failure"));
    }
}
