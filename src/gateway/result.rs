use bytes::Bytes;
use std::sync::OnceLock;
use tracing::debug;

use crate::amf::{decode_envelope, AmfValue};

/// Status of a call that never got an HTTP response.
pub const FAILED_STATUS: i32 = -1;
pub const RATE_LIMITED_STATUS: i32 = 500;

const RESULT_MESSAGE: &str = "/1";

/// Outcome of one gateway call: raw body, HTTP status and the lazily
/// decoded `/1` message body.
#[derive(Debug)]
pub struct AmfResult {
    body: Option<Bytes>,
    status_code: i32,
    content: OnceLock<Option<AmfValue>>,
}

impl AmfResult {
    pub fn new(body: Bytes, status_code: u16) -> Self {
        Self { body: Some(body), status_code: status_code as i32, content: OnceLock::new() }
    }

    /// Transport-level failure: no body, status -1.
    pub fn failed() -> Self {
        Self { body: None, status_code: FAILED_STATUS, content: OnceLock::new() }
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.status_code == FAILED_STATUS
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == RATE_LIMITED_STATUS
    }

    /// Decoded body of the `/1` message; `None` when there is no body or it
    /// does not decode. Decoded once, then cached.
    pub fn content(&self) -> Option<&AmfValue> {
        self.content
            .get_or_init(|| {
                let body = self.body.as_ref()?;
                match decode_envelope(body) {
                    Ok(envelope) => envelope.into_message(RESULT_MESSAGE).map(|m| m.body),
                    Err(e) => {
                        debug!(error = %e, "response body did not decode");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Application error code (`Code` field of an object result).
    pub fn code(&self) -> Option<i64> {
        self.content()?.get("Code")?.as_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // version 3, no headers, one message "/1/onResult" -> AVM+ integer 7
    const SEVEN: &[u8] = &[
        0x00, 0x03, 0x00, 0x00, 0x00, 0x01,
        0x00, 0x0b, b'/', b'1', b'/', b'o', b'n', b'R', b'e', b's', b'u', b'l', b't',
        0x00, 0x04, b'n', b'u', b'l', b'l',
        0x00, 0x00, 0x00, 0x00,
        0x11, 0x04, 0x07,
    ];

    #[test]
    fn decodes_result_message() {
        let result = AmfResult::new(Bytes::from_static(SEVEN), 200);
        assert!(result.is_ok());
        assert_eq!(result.content(), Some(&AmfValue::Integer(7)));
        assert_eq!(result.code(), None);
    }

    #[test]
    fn garbage_is_absent_content() {
        let result = AmfResult::new(Bytes::from_static(b"<html>oops</html>"), 200);
        assert!(result.content().is_none());
        assert!(result.content().is_none());
    }

    #[test]
    fn failed_result() {
        let result = AmfResult::failed();
        assert_eq!(result.status_code(), FAILED_STATUS);
        assert!(result.is_failed());
        assert!(result.body().is_none());
        assert!(result.content().is_none());
        assert!(!result.is_rate_limited());
    }

    #[test]
    fn rate_limit_flag() {
        assert!(AmfResult::new(Bytes::new(), 500).is_rate_limited());
        assert!(!AmfResult::new(Bytes::new(), 503).is_rate_limited());
    }

    #[test]
    fn code_from_object_content() {
        // body: AVM+ dynamic anonymous object {Code: 3}
        let mut bytes = SEVEN[..29].to_vec();
        bytes.extend_from_slice(&[0x11, 0x0a, 0x0b, 0x01, 0x09, b'C', b'o', b'd', b'e', 0x04, 0x03, 0x01]);
        let result = AmfResult::new(Bytes::from(bytes), 200);
        assert_eq!(result.code(), Some(3));
    }
}
