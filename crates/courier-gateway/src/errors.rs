//! Error types resolved at the dispatcher boundary.
//!
//! Everything here maps onto a [`TransportSignal`] for the surrounding
//! transport to translate into its own status vocabulary. Application-level
//! failures never appear in this module: handler faults (and unresolved
//! method signatures) are tunnelled through the response payload instead, so
//! a caller can distinguish them from calls that never reached dispatch.

use thiserror::Error;

use courier_protocol::CodecError;

use crate::directory::DirectoryError;
use crate::interceptors::InterceptorRegistryError;

/// Transport-level status category for a boundary error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSignal {
    /// Malformed or unsupported inbound payload; the chain was never
    /// entered.
    BadRequest,
    /// The target is not on the configured allow-list.
    Forbidden,
    /// The target identifier is unregistered.
    NotFound,
    /// The target is registered but not in the running state.
    Unavailable,
    /// Gateway-internal failure (misconfiguration or unencodable response).
    Internal,
}

/// Errors resolved at the dispatcher boundary into transport signals.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound payload was rejected by the codec.
    #[error("rejected inbound payload: {source}")]
    BadPayload {
        /// Underlying codec rejection.
        #[source]
        source: CodecError,
    },

    /// The target is not the allow-listed identifier.
    #[error(transparent)]
    Forbidden(DirectoryError),

    /// The target identifier is unregistered.
    #[error(transparent)]
    TargetNotFound(DirectoryError),

    /// An interceptor delegated past the end of the chain.
    #[error("interceptor chain misconfigured: exhausted at position {position} (length {length})")]
    ChainExhausted {
        /// Cursor position of the rejected delegation.
        position: usize,
        /// Number of interceptors in the chain.
        length: usize,
    },

    /// Neither the response nor the fault describing its encode failure
    /// could be encoded; fatal to this request only.
    #[error("failed to encode response: {source}")]
    Encode {
        /// The second-stage encode failure.
        #[source]
        source: CodecError,
    },
}

impl GatewayError {
    /// The transport-level status category for this error.
    #[must_use]
    pub fn signal(&self) -> TransportSignal {
        match self {
            Self::BadPayload { .. } => TransportSignal::BadRequest,
            Self::Forbidden(_) => TransportSignal::Forbidden,
            Self::TargetNotFound(_) => TransportSignal::NotFound,
            Self::ChainExhausted { .. } | Self::Encode { .. } => TransportSignal::Internal,
        }
    }

    /// Wraps a codec rejection of the inbound payload.
    pub fn bad_payload(source: CodecError) -> Self {
        Self::BadPayload { source }
    }

    /// Wraps a second-stage encode failure.
    pub fn encode(source: CodecError) -> Self {
        Self::Encode { source }
    }

    pub(crate) fn from_directory(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Forbidden { .. } => Self::Forbidden(error),
            _ => Self::TargetNotFound(error),
        }
    }
}

/// Errors raised while assembling a gateway from configuration.
#[derive(Debug, Error)]
pub enum GatewayBuildError {
    /// A configured interceptor name is unknown.
    #[error(transparent)]
    Interceptor(#[from] InterceptorRegistryError),

    /// The configured encoding label is unsupported.
    #[error("invalid codec configuration: {source}")]
    Codec {
        /// Underlying codec rejection.
        #[source]
        source: CodecError,
    },
}
