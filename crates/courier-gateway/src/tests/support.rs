//! Shared harness utilities for the gateway test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use courier_protocol::{
    InvocationRequest, MethodSignature, ResponseEnvelope, TextEncoding, WireCodec,
};

use crate::chain::{ChainLink, Interceptor};
use crate::directory::{HandlerDirectory, HandlerState};
use crate::dispatch::Gateway;
use crate::handler::{Handler, HandlerFault};
use crate::invocation::Invocation;
use crate::invoker::InvokeError;

/// Signature of the echo method every test handler carries.
pub fn echo_signature() -> MethodSignature {
    MethodSignature::new("echo", ["String"])
}

/// Builds a handler with an echoing method, a failing method, and an adder.
pub fn test_handler(name: &str) -> Handler {
    let mut handler = Handler::new(name);
    handler
        .register(&echo_signature(), |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        })
        .expect("register echo");
    let denial = format!("denied by {name}");
    handler
        .register(&MethodSignature::new("fail", ["String"]), move |_| {
            Err(HandlerFault::new(denial.clone()))
        })
        .expect("register fail");
    handler
        .register(&MethodSignature::new("add", ["i64", "i64"]), |args| {
            let sum = args.iter().filter_map(Value::as_i64).sum::<i64>();
            Ok(json!(sum))
        })
        .expect("register add");
    handler
}

/// Builds a directory holding a started test handler per identifier.
pub fn started_directory(ids: &[&str]) -> Arc<HandlerDirectory> {
    let directory = HandlerDirectory::new();
    for id in ids {
        directory
            .register(*id, Arc::new(test_handler(id)))
            .expect("register handler");
        directory
            .set_state(id, HandlerState::Started)
            .expect("start handler");
    }
    Arc::new(directory)
}

/// Builds a default gateway over a directory holding `ids`.
pub fn gateway_for(ids: &[&str]) -> Gateway {
    Gateway::builder(started_directory(ids)).build()
}

/// Encodes an invocation request with the default codec.
pub fn encoded_request(target: &str, method: MethodSignature, arguments: Vec<Value>) -> Vec<u8> {
    let request = InvocationRequest::new(target, method, arguments);
    WireCodec::default()
        .encode_request(&request)
        .expect("encode request")
}

/// Encodes an echo request for `target` carrying a single string argument.
pub fn echo_request(target: &str, argument: &str) -> Vec<u8> {
    encoded_request(target, echo_signature(), vec![json!(argument)])
}

/// Decodes a response produced with the default codec.
pub fn decoded_response(bytes: &[u8]) -> ResponseEnvelope {
    WireCodec::default()
        .decode_response(bytes)
        .expect("decode response")
}

/// Decodes a response produced with a Latin-1 codec.
pub fn decoded_latin1_response(bytes: &[u8]) -> ResponseEnvelope {
    WireCodec::new(TextEncoding::Latin1)
        .decode_response(bytes)
        .expect("decode latin-1 response")
}

/// Interceptor that counts its calls and records the cursor position it ran
/// at before delegating onward.
pub struct Recording {
    name: String,
    calls: Arc<AtomicUsize>,
    positions: Arc<Mutex<Vec<isize>>>,
}

impl Recording {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            calls: Arc::new(AtomicUsize::new(0)),
            positions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn positions(&self) -> Arc<Mutex<Vec<isize>>> {
        Arc::clone(&self.positions)
    }
}

impl Interceptor for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    fn intercept(
        &self,
        invocation: &mut Invocation,
        next: ChainLink<'_>,
    ) -> Result<Value, InvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.positions
            .lock()
            .expect("positions mutex")
            .push(next.position());
        next.proceed(invocation)
    }
}

/// Interceptor that answers without delegating.
pub struct ShortCircuit {
    pub value: Value,
}

impl Interceptor for ShortCircuit {
    fn name(&self) -> &str {
        "short-circuit"
    }

    fn intercept(
        &self,
        _invocation: &mut Invocation,
        _next: ChainLink<'_>,
    ) -> Result<Value, InvokeError> {
        Ok(self.value.clone())
    }
}

/// Interceptor that retargets every call to a fixed handler.
pub struct Rebind {
    pub target: String,
    pub handler: Arc<Handler>,
}

impl Interceptor for Rebind {
    fn name(&self) -> &str {
        "rebind"
    }

    fn intercept(
        &self,
        invocation: &mut Invocation,
        next: ChainLink<'_>,
    ) -> Result<Value, InvokeError> {
        invocation.rebind(self.target.clone(), Arc::clone(&self.handler));
        next.proceed(invocation)
    }
}
