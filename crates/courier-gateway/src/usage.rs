//! Resource usage reporting for the gateway's side channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Failure raised by a usage source.
#[derive(Debug, Clone, Error)]
#[error("usage source failed: {message}")]
pub struct UsageError {
    message: String,
}

impl UsageError {
    /// Creates a usage error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of the comparable scalar reported by `ResourceUsage`.
///
/// A seam so hosts can feed their own load figure; the gateway's default is
/// its in-flight invocation gauge.
pub trait UsageSource: Send + Sync {
    /// Produces the current usage sample.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] when the underlying source cannot be read; the
    /// gateway encodes the failure rather than dropping the request.
    fn sample(&self) -> Result<u64, UsageError>;
}

/// Usage source backed by the gateway's in-flight invocation gauge.
#[derive(Debug, Clone, Default)]
pub struct InFlightSource {
    gauge: Arc<AtomicU64>,
}

impl InFlightSource {
    /// Creates a source over an existing gauge.
    #[must_use]
    pub fn new(gauge: Arc<AtomicU64>) -> Self {
        Self { gauge }
    }
}

impl UsageSource for InFlightSource {
    fn sample(&self) -> Result<u64, UsageError> {
        Ok(self.gauge.load(Ordering::SeqCst))
    }
}

/// Guard that counts an invocation as in flight until dropped.
pub(crate) struct InFlightGuard {
    gauge: Arc<AtomicU64>,
}

impl InFlightGuard {
    pub(crate) fn enter(gauge: Arc<AtomicU64>) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self { gauge }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.fetch_sub(1, Ordering::SeqCst);
    }
}
