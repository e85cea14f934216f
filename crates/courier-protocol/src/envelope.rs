//! Response envelope distinguishing results from application-level faults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Classification of an application-level failure.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FaultKind {
    /// The handler's own logic raised a failure.
    #[default]
    Invocation,
    /// The method signature could not be resolved on the handler.
    MethodNotFound,
    /// The response payload could not be represented in the active encoding.
    Encode,
    /// The configured usage source failed to produce a sample.
    Usage,
}

/// Application-level failure tunnelled through the response payload.
///
/// A fault travels back with a normal success transport status so the caller
/// can distinguish "the call reached the handler and it failed" from "the
/// call never reached the handler".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fault {
    /// Failure classification.
    pub kind: FaultKind,
    /// Human-readable failure description.
    pub message: String,
}

impl Fault {
    /// Creates a fault with the given classification.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an invocation fault from a handler failure message.
    #[must_use]
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Invocation, message)
    }
}

/// Outcome of a dispatched invocation: exactly one slot is populated.
///
/// Modelled as an enum so the mutual exclusion of the result and failure
/// slots holds by construction. An envelope is created fresh per request,
/// serialized once, and discarded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseEnvelope {
    /// Successful result value.
    Result(Value),
    /// Application-level failure description.
    Fault(Fault),
}

impl ResponseEnvelope {
    /// Creates an envelope carrying a result value.
    #[must_use]
    pub fn result(value: Value) -> Self {
        Self::Result(value)
    }

    /// Creates an envelope carrying a fault.
    #[must_use]
    pub fn fault(fault: Fault) -> Self {
        Self::Fault(fault)
    }

    /// Returns the result value when the envelope holds one.
    #[must_use]
    pub fn as_result(&self) -> Option<&Value> {
        match self {
            Self::Result(value) => Some(value),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault when the envelope holds one.
    #[must_use]
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Result(_) => None,
            Self::Fault(fault) => Some(fault),
        }
    }
}
