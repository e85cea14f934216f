//! Wire types and codec for the Courier invocation protocol.
//!
//! The crate defines the two payloads that cross the transport boundary — an
//! [`InvocationRequest`] on the way in and a [`ResponseEnvelope`] on the way
//! out — together with the [`WireCodec`] that maps them to and from bytes.
//! The transport itself (sockets, HTTP, whatever the host plugs in) is out of
//! scope; everything here is plain data plus synchronous encode/decode.
//!
//! Payloads are single JSON documents tagged with a `kind` field. A document
//! that parses but is not tagged as an invocation is rejected as an
//! unsupported payload rather than a malformed one, so callers can tell the
//! two client errors apart.

mod codec;
mod envelope;
mod errors;
mod request;

pub use codec::{TextEncoding, WireCodec};
pub use envelope::{Fault, FaultKind, ResponseEnvelope};
pub use errors::CodecError;
pub use request::{InvocationRequest, MethodSignature};
