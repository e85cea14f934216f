//! Synchronous invocation gateway for the Courier dispatch core.
//!
//! The gateway sits between a byte-oriented transport and a registry of
//! typed handlers. An inbound payload is decoded through
//! [`courier_protocol`], checked against the configured allow-list, bound to
//! the handler resolved from the [`HandlerDirectory`], and run through an
//! ordered interceptor chain whose terminal step performs the typed method
//! dispatch. The outcome travels back as a response envelope holding either
//! a result or a fault.
//!
//! Chains are immutable once built and shared across calls; each call walks
//! its own [`ChainCursor`], so concurrent invocations of the same cached
//! chain never observe one another's progress. Two side channels accompany
//! dispatch: a liveness probe over the directory's lifecycle states and a
//! resource-usage report fed by a pluggable [`UsageSource`].

mod cache;
mod chain;
mod directory;
mod dispatch;
mod errors;
mod handler;
mod interceptors;
mod invocation;
mod invoker;
pub mod telemetry;
mod usage;

pub use cache::{ChainBlueprint, ChainCache, ChainKey};
pub use chain::{ChainCursor, ChainLink, Interceptor, InterceptorChain};
pub use directory::{DirectoryError, HandlerDirectory, HandlerState};
pub use dispatch::{AliveStatus, Gateway, GatewayBuilder};
pub use errors::{GatewayBuildError, GatewayError, TransportSignal};
pub use handler::{DuplicateMethod, Handler, HandlerFault, MethodFn};
pub use interceptors::{InterceptorRegistry, InterceptorRegistryError, TraceInterceptor};
pub use invocation::Invocation;
pub use invoker::{InvokeError, Invoker, RegistryInvoker};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use usage::{InFlightSource, UsageError, UsageSource};

#[cfg(test)]
mod tests;
