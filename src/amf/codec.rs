//! Remoting envelope framing.
//!
//! ```text
//! u16 version | u16 header count | headers | u16 message count | messages
//! header:  u16 name len, name, u8 required, u32 length, AMF0 value
//! message: u16 target len, target, u16 response len, response, u32 length, AMF0 body
//! ```
//!
//! The u32 length fields are only filled in by a strict codec; the gateway
//! accepts zero there.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::amf0::{self, Amf0Reader};
use super::amf3::Amf3Writer;
use super::cursor::Cursor;
use super::{AmfError, AmfValue};
use crate::checksum::CallArgument;

/// Envelope version whose values are AMF3 behind the AVM+ switch.
pub const AMF3_ENVELOPE: u16 = 3;
pub const AMF0_ENVELOPE: u16 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub required: bool,
    pub value: CallArgument,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<CallArgument>) -> Self {
        Self { name: name.into(), required: false, value: value.into() }
    }
}

/// One named call. `response` is the id the server answers under ("/1").
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub target: String,
    pub response: String,
    pub params: Vec<CallArgument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub version: u16,
    pub headers: Vec<Header>,
    pub requests: Vec<Request>,
}

impl RequestEnvelope {
    pub fn new() -> Self {
        Self { version: AMF3_ENVELOPE, headers: Vec::new(), requests: Vec::new() }
    }

    pub fn header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn request(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }
}

impl Default for RequestEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

/// Status suffix of a response target (`/1/onResult`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Result,
    Status,
    DebugEvents,
}

impl ResponseStatus {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "onResult" => Some(ResponseStatus::Result),
            "onStatus" => Some(ResponseStatus::Status),
            "onDebugEvents" => Some(ResponseStatus::DebugEvents),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHeader {
    pub name: String,
    pub required: bool,
    pub value: AmfValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Target with the status suffix split off (`/1`).
    pub name: String,
    pub status: Option<ResponseStatus>,
    pub target: String,
    pub response: String,
    pub body: AmfValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub version: u16,
    pub headers: Vec<DecodedHeader>,
    pub messages: Vec<Message>,
}

impl ResponseEnvelope {
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn into_message(self, name: &str) -> Option<Message> {
        self.messages.into_iter().find(|m| m.name == name)
    }
}

/// Framing codec for remoting envelopes: encodes requests, decodes whatever
/// the gateway sends back (including request envelopes, useful in tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct RemotingCodec {
    strict: bool,
}

impl RemotingCodec {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    fn write_framed<F>(&self, dst: &mut BytesMut, body: F) -> Result<(), AmfError>
    where
        F: FnOnce(&mut BytesMut) -> Result<(), AmfError>,
    {
        let len_pos = dst.len();
        dst.put_u32(0);
        let start = dst.len();
        body(dst)?;
        if self.strict {
            let len = dst.len() - start;
            let len = u32::try_from(len).map_err(|_| AmfError::TooLong(len))?;
            dst[len_pos..len_pos + 4].copy_from_slice(&len.to_be_bytes());
        }
        Ok(())
    }
}

fn put_count(dst: &mut BytesMut, count: usize) -> Result<(), AmfError> {
    dst.put_u16(u16::try_from(count).map_err(|_| AmfError::TooLong(count))?);
    Ok(())
}

fn put_short_utf8(dst: &mut BytesMut, s: &str) -> Result<(), AmfError> {
    put_count(dst, s.len())?;
    dst.put_slice(s.as_bytes());
    Ok(())
}

impl<'a> Encoder<&'a RequestEnvelope> for RemotingCodec {
    type Error = AmfError;

    fn encode(&mut self, item: &'a RequestEnvelope, dst: &mut BytesMut) -> Result<(), AmfError> {
        dst.put_u16(item.version);

        put_count(dst, item.headers.len())?;
        for header in &item.headers {
            put_short_utf8(dst, &header.name)?;
            dst.put_u8(header.required as u8);
            self.write_framed(dst, |dst| {
                dst.put_u8(amf0::AVMPLUS);
                Amf3Writer::new().write_value(dst, &header.value)
            })?;
        }

        put_count(dst, item.requests.len())?;
        for request in &item.requests {
            put_short_utf8(dst, &request.target)?;
            put_short_utf8(dst, &request.response)?;
            self.write_framed(dst, |dst| {
                let mut writer = Amf3Writer::new();
                dst.put_u8(amf0::STRICT_ARRAY);
                let count = request.params.len();
                dst.put_u32(u32::try_from(count).map_err(|_| AmfError::TooLong(count))?);
                for param in &request.params {
                    dst.put_u8(amf0::AVMPLUS);
                    writer.write_value(dst, param)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl Decoder for RemotingCodec {
    type Item = ResponseEnvelope;
    type Error = AmfError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ResponseEnvelope>, AmfError> {
        if src.is_empty() {
            return Ok(None);
        }
        let mut cur = Cursor::new(&src[..]);
        match read_envelope(&mut cur) {
            Ok(envelope) => {
                let used = cur.position();
                src.advance(used);
                Ok(Some(envelope))
            }
            // wait for more bytes
            Err(AmfError::UnexpectedEof) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn split_target(target: &str) -> (String, Option<ResponseStatus>) {
    if let Some((name, suffix)) = target.rsplit_once('/') {
        if let Some(status) = ResponseStatus::from_suffix(suffix) {
            return (name.to_owned(), Some(status));
        }
    }
    (target.to_owned(), None)
}

fn read_envelope(cur: &mut Cursor<'_>) -> Result<ResponseEnvelope, AmfError> {
    let version = cur.read_u16()?;
    if version != AMF0_ENVELOPE && version != AMF3_ENVELOPE {
        return Err(AmfError::UnsupportedVersion(version));
    }

    let header_count = cur.read_u16()?;
    let mut headers = Vec::with_capacity(header_count as usize);
    for _ in 0..header_count {
        let name = cur.read_short_utf8()?;
        let required = cur.read_u8()? != 0;
        let _len = cur.read_u32()?;
        let value = Amf0Reader::new().read_value(cur, 0)?;
        headers.push(DecodedHeader { name, required, value });
    }

    let message_count = cur.read_u16()?;
    let mut messages = Vec::with_capacity(message_count as usize);
    for _ in 0..message_count {
        let target = cur.read_short_utf8()?;
        let response = cur.read_short_utf8()?;
        let _len = cur.read_u32()?;
        let body = Amf0Reader::new().read_value(cur, 0)?;
        let (name, status) = split_target(&target);
        messages.push(Message { name, status, target, response, body });
    }

    Ok(ResponseEnvelope { version, headers, messages })
}

/// Encode a request envelope into a fresh buffer.
pub fn encode_envelope(envelope: &RequestEnvelope, strict: bool) -> Result<Bytes, AmfError> {
    let mut dst = BytesMut::new();
    RemotingCodec::new(strict).encode(envelope, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode a complete envelope; trailing truncation is an error here.
pub fn decode_envelope(bytes: &[u8]) -> Result<ResponseEnvelope, AmfError> {
    let mut src = BytesMut::from(bytes);
    RemotingCodec::default()
        .decode_eof(&mut src)?
        .ok_or(AmfError::UnexpectedEof)
}
