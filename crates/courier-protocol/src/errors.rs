//! Error types for wire encoding and decoding.
//!
//! Each variant maps to a specific failure mode so the gateway can resolve
//! codec failures into distinct transport signals: malformed and unsupported
//! payloads are client errors that must never reach the interceptor chain,
//! while encode failures are wrapped into a fresh fault envelope.

use thiserror::Error;

/// Errors surfaced while encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload bytes could not be parsed in the active encoding.
    #[error("malformed payload: {message}")]
    Malformed {
        /// Human-readable parse failure description.
        message: String,
        /// Underlying JSON error, when parsing got that far.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Payload parsed but its declared kind is not an invocation request.
    #[error("unsupported payload kind: {kind}")]
    UnsupportedPayload {
        /// The declared payload kind, or a placeholder when absent.
        kind: String,
    },

    /// Payload structure does not match the request schema.
    #[error("invalid request structure: {message}")]
    InvalidStructure {
        /// Description of the missing or empty field.
        message: String,
    },

    /// The requested text encoding is not supported by this codec.
    #[error("unsupported text encoding: {label}")]
    UnsupportedEncoding {
        /// The encoding label supplied by the transport.
        label: String,
    },

    /// The payload could not be represented in the active encoding.
    #[error("failed to encode payload: {message}")]
    Encode {
        /// Description of the unrepresentable content.
        message: String,
        /// Underlying JSON error, when serialization itself failed.
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl CodecError {
    /// Creates a malformed payload error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed payload error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unsupported payload error.
    pub fn unsupported_payload(kind: impl Into<String>) -> Self {
        Self::UnsupportedPayload { kind: kind.into() }
    }

    /// Creates an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Creates an unsupported encoding error.
    pub fn unsupported_encoding(label: impl Into<String>) -> Self {
        Self::UnsupportedEncoding {
            label: label.into(),
        }
    }

    /// Creates an encode error from a serde error.
    pub fn encode_json(source: serde_json::Error) -> Self {
        Self::Encode {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates an encode error with a custom message.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
            source: None,
        }
    }
}
