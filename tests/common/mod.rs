//! Scripted transport and response builders shared by the integration tests.

#![allow(dead_code)]

use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::collections::VecDeque;

use msp_gateway::amf::amf3::Amf3Writer;
use msp_gateway::amf::{decode_envelope, AmfValue};
use msp_gateway::gateway::{Transport, TransportError, TransportRequest, TransportResponse};
use msp_gateway::CallArgument;

#[derive(Debug, Clone)]
pub enum Outcome {
    Timeout,
    Refused,
    Respond(u16, Bytes),
}

/// Plays back scripted outcomes in order, then repeats `fallback` forever.
/// Every request is recorded.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: Outcome) -> Self {
        Self::new(Vec::new(), outcome)
    }

    pub fn push(&self, outcome: Outcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests.lock().last().cloned().expect("no request recorded")
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);
        let outcome = self.script.lock().pop_front().unwrap_or_else(|| self.fallback.clone());
        match outcome {
            Outcome::Timeout => Err(TransportError::Timeout),
            Outcome::Refused => Err(TransportError::Connect("connection refused".into())),
            Outcome::Respond(status, body) => Ok(TransportResponse { status, body }),
        }
    }
}

/// Gateway response envelope whose `/1/onResult` body is `value`.
pub fn response_bytes(value: &CallArgument) -> Bytes {
    let target = b"/1/onResult";
    let mut buf = BytesMut::new();
    buf.put_u16(3);
    buf.put_u16(0);
    buf.put_u16(1);
    buf.put_u16(target.len() as u16);
    buf.put_slice(target);
    buf.put_u16(4);
    buf.put_slice(b"null");
    buf.put_u32(0);
    buf.put_u8(0x11);
    Amf3Writer::new().write_value(&mut buf, value).expect("encode response");
    buf.freeze()
}

pub fn respond(value: CallArgument) -> Outcome {
    Outcome::Respond(200, response_bytes(&value))
}

/// Decoded request envelope: (headers by position, params of the single call).
pub fn decode_request(request: &TransportRequest) -> (Vec<AmfValue>, Vec<AmfValue>) {
    let envelope = decode_envelope(&request.body).expect("request envelope decodes");
    let headers = envelope.headers.iter().map(|h| h.value.clone()).collect();
    let params = envelope.messages[0]
        .body
        .as_array()
        .expect("params are a strict array")
        .to_vec();
    (headers, params)
}

pub fn header(request: &TransportRequest, name: &str) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.clone())
}
