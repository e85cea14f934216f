//! JSON wire codec with pluggable text encoding.
//!
//! Payloads are single JSON documents tagged with a top-level `kind` field:
//! `invocation` for requests and `response` for envelopes. The codec owns the
//! byte-to-text step so the JSON layer always operates on valid strings; the
//! active [`TextEncoding`] is negotiable per call without mutating the codec
//! the gateway was configured with.

use std::str::{self, FromStr};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::envelope::ResponseEnvelope;
use crate::errors::CodecError;
use crate::request::InvocationRequest;

/// Payload kind tag for invocation requests.
const REQUEST_KIND: &str = "invocation";
/// Payload kind tag for response envelopes.
const RESPONSE_KIND: &str = "response";

/// Text encodings the codec can bind to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, the default wire encoding.
    #[default]
    Utf8,
    /// ISO-8859-1, for transports that negotiate a legacy charset.
    Latin1,
}

impl TextEncoding {
    /// Canonical label for the encoding.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<String, CodecError> {
        match self {
            Self::Utf8 => str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|error| CodecError::malformed(format!("invalid UTF-8: {error}"))),
            // Every byte is a valid Latin-1 scalar, so decoding cannot fail.
            Self::Latin1 => Ok(bytes.iter().map(|&byte| char::from(byte)).collect()),
        }
    }

    fn encode(self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|ch| {
                    // The message stays ASCII so a fault envelope describing
                    // this failure is itself always encodable.
                    u8::try_from(u32::from(ch)).map_err(|_| {
                        CodecError::encode(format!(
                            "character '{}' is not representable in ISO-8859-1",
                            ch.escape_unicode()
                        ))
                    })
                })
                .collect(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = CodecError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Ok(Self::Latin1),
            _ => Err(CodecError::unsupported_encoding(label.trim())),
        }
    }
}

/// Request frame serialized onto the wire.
#[derive(Serialize)]
struct WireRequest<'a> {
    kind: &'static str,
    #[serde(flatten)]
    request: &'a InvocationRequest,
}

/// Response frame serialized onto the wire.
#[derive(Serialize)]
struct WireResponse<'a> {
    kind: &'static str,
    #[serde(flatten)]
    envelope: &'a ResponseEnvelope,
}

/// Codec mapping invocation payloads to and from bytes.
///
/// The codec is cheap to copy; [`WireCodec::negotiate`] produces a derived
/// instance bound to the requested encoding and leaves the original
/// untouched, so a gateway can hold one configured codec and hand out
/// per-call derivations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireCodec {
    encoding: TextEncoding,
}

impl WireCodec {
    /// Creates a codec bound to the given encoding.
    #[must_use]
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    /// The encoding this codec is bound to.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Derives a codec bound to the encoding named by `label`.
    ///
    /// Copy-on-negotiate: the receiver is never mutated. Returns a copy of
    /// the receiver when the label names the already-active encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedEncoding`] when the label is not a
    /// supported charset name.
    pub fn negotiate(&self, label: &str) -> Result<Self, CodecError> {
        let encoding = label.parse::<TextEncoding>()?;
        Ok(Self { encoding })
    }

    /// Decodes raw bytes into an invocation request.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] when the bytes are not a JSON
    /// document in the active encoding, [`CodecError::UnsupportedPayload`]
    /// when the document is well formed but not tagged as an invocation, and
    /// [`CodecError::InvalidStructure`] when required fields are blank.
    pub fn decode_request(&self, bytes: &[u8]) -> Result<InvocationRequest, CodecError> {
        let value = self.decode_value(bytes)?;
        expect_kind(&value, REQUEST_KIND)?;
        let request: InvocationRequest =
            serde_json::from_value(value).map_err(CodecError::from_json_error)?;
        request.validate()?;
        Ok(request)
    }

    /// Encodes an invocation request for the wire (client half).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the payload cannot be represented
    /// in the active encoding.
    pub fn encode_request(&self, request: &InvocationRequest) -> Result<Vec<u8>, CodecError> {
        let frame = WireRequest {
            kind: REQUEST_KIND,
            request,
        };
        self.encode_frame(&frame)
    }

    /// Encodes a response envelope for the wire.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the payload cannot be represented
    /// in the active encoding.
    pub fn encode_response(&self, envelope: &ResponseEnvelope) -> Result<Vec<u8>, CodecError> {
        let frame = WireResponse {
            kind: RESPONSE_KIND,
            envelope,
        };
        self.encode_frame(&frame)
    }

    /// Decodes raw bytes into a response envelope (client half).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] for unparsable bytes and
    /// [`CodecError::UnsupportedPayload`] when the document is not tagged as
    /// a response.
    pub fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope, CodecError> {
        let value = self.decode_value(bytes)?;
        expect_kind(&value, RESPONSE_KIND)?;
        let body = strip_kind(value);
        serde_json::from_value(body).map_err(CodecError::from_json_error)
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = self.encoding.decode(bytes)?;
        serde_json::from_str(&text).map_err(CodecError::from_json_error)
    }

    fn encode_frame<T: Serialize>(&self, frame: &T) -> Result<Vec<u8>, CodecError> {
        let text = serde_json::to_string(frame).map_err(CodecError::encode_json)?;
        self.encoding.encode(&text)
    }
}

/// Checks the top-level `kind` tag of a decoded document.
fn expect_kind(value: &Value, expected: &str) -> Result<(), CodecError> {
    let Value::Object(map) = value else {
        return Err(CodecError::unsupported_payload(json_type_name(value)));
    };
    match map.get("kind").and_then(Value::as_str) {
        Some(kind) if kind == expected => Ok(()),
        Some(kind) => Err(CodecError::unsupported_payload(kind)),
        None => Err(CodecError::unsupported_payload("untagged object")),
    }
}

/// Removes the frame tag so the body matches the envelope schema.
fn strip_kind(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let stripped: Map<String, Value> =
                map.into_iter().filter(|(key, _)| key != "kind").collect();
            Value::Object(stripped)
        }
        other => other,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use crate::envelope::{Fault, FaultKind};
    use crate::request::MethodSignature;

    use super::*;

    fn echo_request() -> InvocationRequest {
        let mut request = InvocationRequest::new(
            "svc1",
            MethodSignature::new("echo", ["String"]),
            vec![json!("hi")],
        );
        request.set_attribute("trace-id", json!("abc"));
        request
    }

    #[test]
    fn request_round_trips_through_the_codec() {
        let codec = WireCodec::default();
        let request = echo_request();
        let bytes = codec.encode_request(&request).expect("encode");
        let decoded = codec.decode_request(&bytes).expect("decode");
        assert_eq!(decoded, request);
    }

    #[rstest]
    #[case(ResponseEnvelope::result(json!("hi")))]
    #[case(ResponseEnvelope::fault(Fault::new(FaultKind::MethodNotFound, "no echo(i64)")))]
    fn envelope_round_trips_through_the_codec(#[case] envelope: ResponseEnvelope) {
        let codec = WireCodec::default();
        let bytes = codec.encode_response(&envelope).expect("encode");
        let decoded = codec.decode_response(&bytes).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn rejects_unparsable_bytes_as_malformed() {
        let codec = WireCodec::default();
        let result = codec.decode_request(b"{not json");
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn rejects_plain_string_payload_as_unsupported() {
        let codec = WireCodec::default();
        let result = codec.decode_request(br#""just a string""#);
        assert!(matches!(
            result,
            Err(CodecError::UnsupportedPayload { kind }) if kind == "string"
        ));
    }

    #[test]
    fn rejects_wrongly_tagged_object_as_unsupported() {
        let codec = WireCodec::default();
        let result = codec.decode_request(br#"{"kind":"response","result":1}"#);
        assert!(matches!(
            result,
            Err(CodecError::UnsupportedPayload { kind }) if kind == "response"
        ));
    }

    #[test]
    fn rejects_blank_target_as_invalid_structure() {
        let codec = WireCodec::default();
        let bytes = br#"{"kind":"invocation","target":" ","method":{"name":"echo"}}"#;
        assert!(matches!(
            codec.decode_request(bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[rstest]
    #[case("utf-8", TextEncoding::Utf8)]
    #[case("UTF8", TextEncoding::Utf8)]
    #[case("iso-8859-1", TextEncoding::Latin1)]
    #[case(" Latin-1 ", TextEncoding::Latin1)]
    fn parses_encoding_labels(#[case] label: &str, #[case] expected: TextEncoding) {
        assert_eq!(label.parse::<TextEncoding>().expect("parse"), expected);
    }

    #[test]
    fn negotiate_derives_a_codec_without_touching_the_original() {
        let codec = WireCodec::default();
        let derived = codec.negotiate("iso-8859-1").expect("negotiate");
        assert_eq!(derived.encoding(), TextEncoding::Latin1);
        assert_eq!(codec.encoding(), TextEncoding::Utf8);
    }

    #[test]
    fn negotiate_rejects_unknown_labels() {
        let codec = WireCodec::default();
        assert!(matches!(
            codec.negotiate("utf-16"),
            Err(CodecError::UnsupportedEncoding { label }) if label == "utf-16"
        ));
    }

    #[test]
    fn latin1_round_trips_high_bytes() {
        let codec = WireCodec::new(TextEncoding::Latin1);
        let envelope = ResponseEnvelope::result(json!("café"));
        let bytes = codec.encode_response(&envelope).expect("encode");
        // 0xE9 is the Latin-1 byte for é; the UTF-8 form would be two bytes.
        assert!(bytes.contains(&0xE9));
        let decoded = codec.decode_response(&bytes).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn latin1_rejects_unrepresentable_characters() {
        let codec = WireCodec::new(TextEncoding::Latin1);
        let envelope = ResponseEnvelope::result(json!("snowman \u{2603}"));
        assert!(matches!(
            codec.encode_response(&envelope),
            Err(CodecError::Encode { .. })
        ));
    }
}
