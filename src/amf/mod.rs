//! AMF wire format: the remoting envelope spoken by the gateway.
//!
//! - `value`: generic decoded value tree (`AmfValue`)
//! - `amf3`: AMF3 writer for call arguments and AMF3 reader
//! - `amf0`: AMF0 reader (response envelopes switch into AMF3 via 0x11)
//! - `codec`: request/response envelopes and the `RemotingCodec` framing
//!
//! Encoding only ever needs AMF3 (a version 3 envelope wraps every value in
//! the AVM+ switch marker); decoding accepts both.

pub mod amf0;
pub mod amf3;
pub mod codec;
pub mod value;

mod cursor;
mod refs;

pub use codec::{
    decode_envelope, encode_envelope, DecodedHeader, Header, Message, RemotingCodec, Request,
    RequestEnvelope, ResponseEnvelope, ResponseStatus, AMF3_ENVELOPE,
};
pub use value::AmfValue;

use thiserror::Error;

/// Nesting limit for decoded values; deeper payloads are rejected instead of
/// exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// Upper bound on what one decode context may materialise, counting strings,
/// nodes and back-reference expansions.
pub const MAX_DECODED_BYTES: usize = 64 * 1024 * 1024;

/// Codec errors
#[derive(Debug, Error)]
pub enum AmfError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unknown {format} type marker 0x{marker:02x}")]
    UnknownMarker { format: &'static str, marker: u8 },

    #[error("invalid utf-8 in string")]
    InvalidUtf8,

    #[error("dangling {kind} reference {index}")]
    BadReference { kind: &'static str, index: usize },

    #[error("unsupported externalizable class {0:?}")]
    Externalizable(String),

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u16),

    #[error("invalid date value {0}")]
    InvalidDate(f64),

    #[error("mapping keys must not be empty")]
    EmptyKey,

    #[error("length {0} does not fit the wire field")]
    TooLong(usize),

    #[error("value nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,

    #[error("decoded value exceeds {0} bytes")]
    TooLarge(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
