//! Handler directory: identifier resolution, access control, and liveness.
//!
//! The directory is an explicit instance owned by the host and passed into
//! the gateway at construction; there is no ambient global registry. It is
//! read-mostly: invocations resolve concurrently while lifecycle transitions
//! (`set_state`) arrive from outside. Liveness queries always read the
//! current state under the lock, never a cached copy.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use strum::Display;
use thiserror::Error;

use crate::handler::Handler;

/// Lifecycle state of a registered handler.
///
/// Only [`HandlerState::Started`] permits invocation; liveness queries map
/// every other state to "unavailable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HandlerState {
    /// Registered but not yet asked to start.
    Created,
    /// Startup in progress.
    Starting,
    /// Live and accepting invocations.
    Started,
    /// Shutdown in progress.
    Stopping,
    /// Stopped cleanly; may be restarted.
    Stopped,
    /// Startup or runtime failure.
    Failed,
    /// Permanently removed; terminal state.
    Destroyed,
}

/// Errors surfaced by directory lookups.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No handler is registered under the identifier.
    #[error("no handler registered for target '{target}'")]
    NotFound {
        /// Identifier that was looked up.
        target: String,
    },

    /// The identifier is not on the configured allow-list.
    #[error("target '{target}' is not the allow-listed target '{allowed}'")]
    Forbidden {
        /// Identifier the caller asked for.
        target: String,
        /// The sole identifier the allow-list permits.
        allowed: String,
    },

    /// A handler is already registered under the identifier.
    #[error("a handler is already registered for target '{target}'")]
    AlreadyRegistered {
        /// Identifier that collided.
        target: String,
    },
}

impl DirectoryError {
    /// Creates a not-found error.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }
}

struct HandlerEntry {
    handler: Arc<Handler>,
    state: HandlerState,
}

/// Lookup service mapping opaque identifiers to handlers and their state.
#[derive(Default)]
pub struct HandlerDirectory {
    // Writers (register/set_state) never panic mid-update, so a poisoned
    // lock still guards a structurally intact map and reads recover from it.
    entries: RwLock<HashMap<String, HandlerEntry>>,
}

impl HandlerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under an identifier, in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::AlreadyRegistered`] when the identifier is
    /// taken.
    pub fn register(
        &self,
        id: impl Into<String>,
        handler: Arc<Handler>,
    ) -> Result<(), DirectoryError> {
        let id = id.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&id) {
            return Err(DirectoryError::AlreadyRegistered { target: id });
        }
        entries.insert(
            id,
            HandlerEntry {
                handler,
                state: HandlerState::Created,
            },
        );
        Ok(())
    }

    /// Records an externally driven lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when the identifier is
    /// unregistered.
    pub fn set_state(&self, id: &str, state: HandlerState) -> Result<(), DirectoryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(id) {
            Some(entry) => {
                entry.state = state;
                Ok(())
            }
            None => Err(DirectoryError::not_found(id)),
        }
    }

    /// Resolves an identifier to its live handler instance.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when the identifier is
    /// unregistered.
    pub fn resolve(&self, id: &str) -> Result<Arc<Handler>, DirectoryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .map(|entry| Arc::clone(&entry.handler))
            .ok_or_else(|| DirectoryError::not_found(id))
    }

    /// Checks an identifier against the configured allow-list entry.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Forbidden`] when `id` differs from
    /// `allowed`.
    pub fn check_access(&self, id: &str, allowed: &str) -> Result<(), DirectoryError> {
        if id == allowed {
            Ok(())
        } else {
            Err(DirectoryError::Forbidden {
                target: id.to_owned(),
                allowed: allowed.to_owned(),
            })
        }
    }

    /// Reads the current lifecycle state of a handler.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when the identifier is
    /// unregistered.
    pub fn liveness(&self, id: &str) -> Result<HandlerState, DirectoryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .map(|entry| entry.state)
            .ok_or_else(|| DirectoryError::not_found(id))
    }
}
