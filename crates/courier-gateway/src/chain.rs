//! Interceptor chains with call-scoped cursors.
//!
//! A chain is an immutable, ordered sequence of interceptors terminated by
//! an [`Invoker`]. The structure is built once and may be cache-shared across
//! concurrent invocations; the cursor that tracks delegation progress is a
//! [`ChainCursor`] value created per call and threaded through each step, so
//! no invocation can ever observe another's position. Each interceptor
//! receives a [`ChainLink`] continuation and either delegates onward with
//! [`ChainLink::proceed`] or short-circuits by returning without delegating
//! (caching, validation rejection, circuit breaking).
//!
//! Delegation past the terminal invoker is a configuration bug and fails
//! fast with [`InvokeError::ChainExhausted`]; failures from interceptors or
//! the terminal invoker propagate unchanged — the chain never swallows or
//! retries.

use std::sync::Arc;

use serde_json::Value;

use crate::invocation::Invocation;
use crate::invoker::{InvokeError, Invoker};

/// Per-invocation delegation position.
///
/// `-1` is idle (no link has run), `0..len` indexes the interceptor that ran
/// last, and `len` means the terminal invoker has run. The cursor is created
/// fresh per call and reset again afterwards on every exit path, so a chain
/// observed between invocations is always idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCursor {
    position: isize,
}

impl ChainCursor {
    /// Cursor position before any link has run.
    pub const IDLE: isize = -1;

    /// Creates an idle cursor.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            position: Self::IDLE,
        }
    }

    /// Returns the cursor to the idle position.
    pub fn reset(&mut self) {
        self.position = Self::IDLE;
    }

    /// Whether no link has run yet.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.position == Self::IDLE
    }

    /// Current position (`-1` when idle).
    #[must_use]
    pub fn position(&self) -> isize {
        self.position
    }

    fn advance(&mut self) -> usize {
        self.position = self.position.saturating_add(1);
        usize::try_from(self.position).unwrap_or(usize::MAX)
    }
}

impl Default for ChainCursor {
    fn default() -> Self {
        Self::idle()
    }
}

/// Continuation handed to an interceptor: the chain plus the call's cursor.
///
/// Consuming `proceed` moves the continuation, so an interceptor delegates
/// at most once per invocation.
pub struct ChainLink<'a> {
    chain: &'a InterceptorChain,
    cursor: &'a mut ChainCursor,
}

impl ChainLink<'_> {
    /// Delegates to the next link (or the terminal invoker).
    ///
    /// # Errors
    ///
    /// Propagates whatever the rest of the chain raises.
    pub fn proceed(self, invocation: &mut Invocation) -> Result<Value, InvokeError> {
        self.chain.invoke_next(self.cursor, invocation)
    }

    /// The cursor position of the interceptor currently running.
    #[must_use]
    pub fn position(&self) -> isize {
        self.cursor.position()
    }
}

/// A unit of cross-cutting logic inserted into the call path.
pub trait Interceptor: Send + Sync {
    /// Registry name of the interceptor.
    fn name(&self) -> &str;

    /// Runs the interceptor's logic around delegation to `next`.
    ///
    /// # Errors
    ///
    /// Implementations propagate failures from `next` unchanged, or raise
    /// their own.
    fn intercept(
        &self,
        invocation: &mut Invocation,
        next: ChainLink<'_>,
    ) -> Result<Value, InvokeError>;
}

/// Immutable interceptor sequence terminated by an invoker.
pub struct InterceptorChain {
    links: Vec<Arc<dyn Interceptor>>,
    terminal: Arc<dyn Invoker>,
}

impl InterceptorChain {
    /// Builds a chain from an ordered interceptor list and a terminal
    /// invoker.
    #[must_use]
    pub fn new(links: Vec<Arc<dyn Interceptor>>, terminal: Arc<dyn Invoker>) -> Self {
        Self { links, terminal }
    }

    /// Number of interceptors (excluding the terminal invoker).
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Advances the cursor and dispatches the link it now points at.
    ///
    /// Called with an idle cursor this starts the chain; interceptors call
    /// it again (through [`ChainLink::proceed`]) to delegate onward. When
    /// the cursor moves past the interceptors the terminal invoker runs.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::ChainExhausted`] when called with a cursor
    /// already at or past the terminal position; otherwise propagates the
    /// dispatched link's outcome unchanged.
    pub fn invoke_next(
        &self,
        cursor: &mut ChainCursor,
        invocation: &mut Invocation,
    ) -> Result<Value, InvokeError> {
        let index = cursor.advance();
        if let Some(link) = self.links.get(index) {
            let link = Arc::clone(link);
            return link.intercept(invocation, ChainLink {
                chain: self,
                cursor,
            });
        }
        if index == self.links.len() {
            let handler = Arc::clone(invocation.handler());
            let signature = invocation.signature().clone();
            return self
                .terminal
                .invoke(&handler, &signature, invocation.arguments());
        }
        Err(InvokeError::ChainExhausted {
            position: index,
            length: self.links.len(),
        })
    }
}
