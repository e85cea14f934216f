//! Call-scoped invocation state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use courier_protocol::{InvocationRequest, MethodSignature};

use crate::handler::Handler;

/// A decoded request bound to its resolved handler.
///
/// Created once per call after directory resolution; the opaque target
/// identifier in the wire request is replaced by the concrete handler here
/// and is never re-resolved mid-chain. Interceptors may mutate the attribute
/// bag or explicitly [`rebind`](Invocation::rebind) the call to a different
/// handler; both are ordinary side effects of the chain.
#[derive(Debug)]
pub struct Invocation {
    target: String,
    signature: MethodSignature,
    arguments: Vec<Value>,
    attributes: BTreeMap<String, Value>,
    handler: Arc<Handler>,
}

impl Invocation {
    /// Binds a decoded request to the handler its target resolved to.
    #[must_use]
    pub fn bind(request: InvocationRequest, handler: Arc<Handler>) -> Self {
        Self {
            target: request.target().to_owned(),
            signature: request.method,
            arguments: request.arguments,
            attributes: request.attributes,
            handler,
        }
    }

    /// The identifier the call was originally addressed to, or the identity
    /// set by the most recent rebind.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Method the terminal invoker will dispatch.
    #[must_use]
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Positional arguments.
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// The handler currently bound to the call.
    #[must_use]
    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Retargets the call to a different handler.
    pub fn rebind(&mut self, target: impl Into<String>, handler: Arc<Handler>) {
        self.target = target.into();
        self.handler = handler;
    }

    /// Stores an attribute, returning any previous value under the key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(key.into(), value)
    }

    /// Looks up an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
