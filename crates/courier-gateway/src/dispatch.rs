//! Invocation dispatch orchestration.
//!
//! The [`Gateway`] is what the transport-facing collaborator talks to. Per
//! request it decodes the payload, checks the allow-list, resolves the
//! target through the handler directory (rebinding the call to the concrete
//! handler), obtains the interceptor chain (cached by call identity or built
//! fresh per call), runs it with a fresh cursor, and encodes the outcome.
//! Two side channels ride alongside: a liveness probe and a resource-usage
//! report.
//!
//! Boundary failures surface as [`GatewayError`] values the transport maps
//! onto its own status vocabulary; failures raised past the directory —
//! handler faults and unresolved method signatures — are tunnelled through
//! the fault slot of the response envelope with a normal transport status.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tracing::{debug, warn};

use courier_config::{Config, InvokerKind};
use courier_protocol::{
    Fault, FaultKind, InvocationRequest, ResponseEnvelope, TextEncoding, WireCodec,
};

use crate::cache::{ChainBlueprint, ChainCache, ChainKey};
use crate::chain::{ChainCursor, Interceptor, InterceptorChain};
use crate::directory::{HandlerDirectory, HandlerState};
use crate::errors::{GatewayBuildError, GatewayError, TransportSignal};
use crate::interceptors::InterceptorRegistry;
use crate::invocation::Invocation;
use crate::invoker::{InvokeError, Invoker, RegistryInvoker};
use crate::usage::{InFlightGuard, InFlightSource, UsageSource};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Outcome of a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliveStatus {
    /// Missing or blank identifier; the probe is a no-op.
    Ignored,
    /// No handler is registered under the identifier.
    NotFound,
    /// The handler exists but is not in the running state.
    Unavailable(HandlerState),
    /// The handler is started; success with no body.
    Alive,
}

impl AliveStatus {
    /// The transport signal to report, when one applies.
    ///
    /// `Alive` and `Ignored` yield `None`: success-empty and no-response
    /// respectively.
    #[must_use]
    pub fn transport_signal(&self) -> Option<TransportSignal> {
        match self {
            Self::Ignored | Self::Alive => None,
            Self::NotFound => Some(TransportSignal::NotFound),
            Self::Unavailable(_) => Some(TransportSignal::Unavailable),
        }
    }
}

enum ChainPolicy {
    /// Chains cached by call identity and shared across invocations.
    Cached(ChainCache),
    /// A fresh, uncached chain per call; no key derivation.
    PerCall(ChainBlueprint),
}

/// The invocation dispatcher.
pub struct Gateway {
    directory: Arc<HandlerDirectory>,
    codec: WireCodec,
    allowed_target: Option<String>,
    chains: ChainPolicy,
    usage: Arc<dyn UsageSource>,
    in_flight: Arc<AtomicU64>,
    content_type: String,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("codec", &self.codec)
            .field("allowed_target", &self.allowed_target)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Starts building a gateway over a handler directory.
    #[must_use]
    pub fn builder(directory: Arc<HandlerDirectory>) -> GatewayBuilder {
        GatewayBuilder::new(directory)
    }

    /// Assembles a gateway from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayBuildError`] when a configured interceptor name is
    /// unknown or the encoding label is unsupported.
    pub fn from_config(
        config: &Config,
        directory: Arc<HandlerDirectory>,
        registry: &InterceptorRegistry,
    ) -> Result<Self, GatewayBuildError> {
        let interceptors = registry.resolve_list(&config.interceptors)?;
        let encoding = config
            .encoding_label()
            .parse::<TextEncoding>()
            .map_err(|source| GatewayBuildError::Codec { source })?;
        let terminal: Arc<dyn Invoker> = match config.invoker() {
            InvokerKind::Registry => Arc::new(RegistryInvoker::new()),
        };

        let mut builder = Self::builder(directory)
            .codec(WireCodec::new(encoding))
            .interceptors(interceptors)
            .terminal(terminal)
            .chain_cache(config.chain_cache_enabled())
            .content_type(config.content_type());
        if let Some(allowed) = &config.allowed_target {
            builder = builder.allowed_target(allowed);
        }
        Ok(builder.build())
    }

    /// The content-type label the transport should attach to responses.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Dispatches an encoded invocation request with the configured codec.
    ///
    /// # Errors
    ///
    /// See [`Gateway::invoke_with_encoding`].
    pub fn invoke(&self, raw: &[u8]) -> Result<Vec<u8>, GatewayError> {
        self.invoke_with_encoding(raw, None)
    }

    /// Dispatches an encoded invocation request, negotiating the wire
    /// encoding when the transport requests one.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] carrying the transport signal for
    /// payloads rejected before the chain (malformed, unsupported,
    /// forbidden, unresolved target) and for gateway-internal failures
    /// (chain misconfiguration, unencodable response). Failures raised by
    /// the handler or an unresolved method signature are not errors here;
    /// they come back encoded in the fault slot of the envelope.
    pub fn invoke_with_encoding(
        &self,
        raw: &[u8],
        encoding: Option<&str>,
    ) -> Result<Vec<u8>, GatewayError> {
        let codec = match encoding {
            Some(label) => self
                .codec
                .negotiate(label)
                .map_err(GatewayError::bad_payload)?,
            None => self.codec,
        };

        let request = codec.decode_request(raw).map_err(|error| {
            warn!(target: DISPATCH_TARGET, %error, "rejected inbound payload");
            GatewayError::bad_payload(error)
        })?;
        let target = request.target().to_owned();

        if let Some(allowed) = &self.allowed_target {
            self.directory
                .check_access(&target, allowed)
                .map_err(|error| {
                    warn!(target: DISPATCH_TARGET, target_id = %target, %error, "access denied");
                    GatewayError::from_directory(error)
                })?;
        }

        let handler = self
            .directory
            .resolve(&target)
            .map_err(GatewayError::from_directory)?;

        debug!(
            target: DISPATCH_TARGET,
            target_id = %target,
            signature = %request.method,
            "dispatching invocation"
        );

        let _guard = InFlightGuard::enter(Arc::clone(&self.in_flight));
        let chain = self.chain_for(&target, &request);
        let mut invocation = Invocation::bind(request, handler);

        let mut cursor = ChainCursor::idle();
        let outcome = chain.invoke_next(&mut cursor, &mut invocation);
        // Leave the chain reusable on every exit path.
        cursor.reset();

        let envelope = match outcome {
            Ok(value) => ResponseEnvelope::result(value),
            Err(InvokeError::Handler(fault)) => {
                debug!(
                    target: DISPATCH_TARGET,
                    target_id = invocation.target(),
                    "handler raised a fault"
                );
                ResponseEnvelope::fault(Fault::invocation(fault.message()))
            }
            Err(error @ InvokeError::MethodNotFound { .. }) => {
                ResponseEnvelope::fault(Fault::new(FaultKind::MethodNotFound, error.to_string()))
            }
            Err(InvokeError::ChainExhausted { position, length }) => {
                return Err(GatewayError::ChainExhausted { position, length });
            }
        };

        self.encode_with_fallback(&codec, &envelope)
    }

    /// Probes the lifecycle state of a target.
    ///
    /// A missing or blank identifier is a no-op; an unknown identifier maps
    /// to not-found; a handler in any state other than `Started` maps to
    /// unavailable. Liveness is read fresh per probe, never cached.
    #[must_use]
    pub fn alive_check(&self, id: Option<&str>) -> AliveStatus {
        let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
            return AliveStatus::Ignored;
        };
        match self.directory.liveness(id) {
            Ok(HandlerState::Started) => AliveStatus::Alive,
            Ok(state) => {
                debug!(target: DISPATCH_TARGET, target_id = %id, state = %state, "target unavailable");
                AliveStatus::Unavailable(state)
            }
            Err(_) => AliveStatus::NotFound,
        }
    }

    /// Reports the configured usage source's current sample.
    ///
    /// A source failure is encoded into the fault slot rather than dropped,
    /// so the caller always receives an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Encode`] only when not even the fault
    /// describing an encode failure could be encoded.
    pub fn resource_usage(&self) -> Result<Vec<u8>, GatewayError> {
        let envelope = match self.usage.sample() {
            Ok(value) => ResponseEnvelope::result(value.into()),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "usage source failed");
                ResponseEnvelope::fault(Fault::new(FaultKind::Usage, error.to_string()))
            }
        };
        self.encode_with_fallback(&self.codec, &envelope)
    }

    fn chain_for(&self, target: &str, request: &InvocationRequest) -> Arc<InterceptorChain> {
        match &self.chains {
            ChainPolicy::Cached(cache) => {
                let key = ChainKey::from_parts(Some(target), Some(&request.method));
                cache.get_or_build(&key)
            }
            ChainPolicy::PerCall(blueprint) => Arc::new(blueprint.build()),
        }
    }

    /// Encodes the envelope; an encode failure is wrapped into a fresh
    /// fault envelope and re-encoded. A second failure is fatal to this
    /// request only.
    fn encode_with_fallback(
        &self,
        codec: &WireCodec,
        envelope: &ResponseEnvelope,
    ) -> Result<Vec<u8>, GatewayError> {
        match codec.encode_response(envelope) {
            Ok(bytes) => Ok(bytes),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    "response unencodable; returning encode fault"
                );
                let fallback = ResponseEnvelope::fault(Fault::new(
                    FaultKind::Encode,
                    error.to_string(),
                ));
                codec.encode_response(&fallback).map_err(|fatal| {
                    warn!(target: DISPATCH_TARGET, error = %fatal, "encode fault itself unencodable");
                    GatewayError::encode(fatal)
                })
            }
        }
    }
}

/// Step-by-step construction of a [`Gateway`].
pub struct GatewayBuilder {
    directory: Arc<HandlerDirectory>,
    codec: WireCodec,
    allowed_target: Option<String>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    terminal: Arc<dyn Invoker>,
    chain_cache: bool,
    usage: Option<Arc<dyn UsageSource>>,
    content_type: String,
}

impl GatewayBuilder {
    fn new(directory: Arc<HandlerDirectory>) -> Self {
        Self {
            directory,
            codec: WireCodec::default(),
            allowed_target: None,
            interceptors: Vec::new(),
            terminal: Arc::new(RegistryInvoker::new()),
            chain_cache: true,
            usage: None,
            content_type: courier_config::default_content_type().to_owned(),
        }
    }

    /// Sets the configured wire codec.
    #[must_use]
    pub fn codec(mut self, codec: WireCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Restricts invocations to a single allow-listed target.
    #[must_use]
    pub fn allowed_target(mut self, target: impl Into<String>) -> Self {
        self.allowed_target = Some(target.into());
        self
    }

    /// Appends an interceptor to the chain order.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replaces the ordered interceptor list.
    #[must_use]
    pub fn interceptors(mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Substitutes the terminal invoker strategy.
    #[must_use]
    pub fn terminal(mut self, terminal: Arc<dyn Invoker>) -> Self {
        self.terminal = terminal;
        self
    }

    /// Enables or disables chain caching by call identity.
    #[must_use]
    pub fn chain_cache(mut self, enabled: bool) -> Self {
        self.chain_cache = enabled;
        self
    }

    /// Substitutes the resource-usage source.
    #[must_use]
    pub fn usage_source(mut self, source: Arc<dyn UsageSource>) -> Self {
        self.usage = Some(source);
        self
    }

    /// Sets the response content-type label.
    #[must_use]
    pub fn content_type(mut self, label: impl Into<String>) -> Self {
        self.content_type = label.into();
        self
    }

    /// Finishes construction.
    #[must_use]
    pub fn build(self) -> Gateway {
        let in_flight = Arc::new(AtomicU64::new(0));
        let usage = self
            .usage
            .unwrap_or_else(|| Arc::new(InFlightSource::new(Arc::clone(&in_flight))));
        let blueprint = ChainBlueprint::new(self.interceptors, self.terminal);
        let chains = if self.chain_cache {
            ChainPolicy::Cached(ChainCache::new(blueprint))
        } else {
            ChainPolicy::PerCall(blueprint)
        };
        Gateway {
            directory: self.directory,
            codec: self.codec,
            allowed_target: self.allowed_target,
            chains,
            usage,
            in_flight,
            content_type: self.content_type,
        }
    }
}
