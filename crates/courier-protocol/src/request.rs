//! Invocation request payload and method signatures.
//!
//! An [`InvocationRequest`] names an opaque target, a method signature, the
//! argument list, and a mutable attribute bag that interceptors may read and
//! write while the call travels through the chain. The request is created by
//! the codec on decode and consumed once by the dispatch path.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CodecError;

/// Method identification by name and parameter types.
///
/// The formatted form (`name(Type,Type)`) is the canonical string used for
/// handler method lookup and chain-cache key derivation, so two signatures
/// compare equal exactly when their formatted forms do.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MethodSignature {
    /// Method name as registered on the handler.
    pub name: String,
    /// Declared parameter type labels, in call order.
    #[serde(default)]
    pub parameter_types: Vec<String>,
}

impl MethodSignature {
    /// Creates a signature from a name and parameter type labels.
    #[must_use]
    pub fn new<N, P, T>(name: N, parameter_types: P) -> Self
    where
        N: Into<String>,
        P: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a signature for a method that takes no parameters.
    #[must_use]
    pub fn nullary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}({})", self.name, self.parameter_types.join(","))
    }
}

/// Decoded method-invocation request.
///
/// The target identifier is opaque to the protocol layer; the gateway
/// resolves it against its handler directory and from then on the concrete
/// handler travels with the call. Interceptors mutate the attribute bag (and
/// may rebind the target) but the request is otherwise consumed once.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InvocationRequest {
    /// Opaque target identifier.
    pub target: String,
    /// Method to invoke on the resolved handler.
    pub method: MethodSignature,
    /// Positional arguments, opaque to the protocol layer.
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Mutable key-value store visible to interceptors.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl InvocationRequest {
    /// Creates a request with an empty attribute bag.
    #[must_use]
    pub fn new(target: impl Into<String>, method: MethodSignature, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            method,
            arguments,
            attributes: BTreeMap::new(),
        }
    }

    /// Validates that required fields are present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidStructure`] if the target or method name
    /// is empty or contains only whitespace.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.target.trim().is_empty() {
            return Err(CodecError::invalid_structure("target field is empty"));
        }
        if self.method.name.trim().is_empty() {
            return Err(CodecError::invalid_structure("method name is empty"));
        }
        Ok(())
    }

    /// Returns the normalised target identifier (trimmed).
    #[must_use]
    pub fn target(&self) -> &str {
        self.target.trim()
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
