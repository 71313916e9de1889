//! Per-call session tokens and the spoofed client address.

use rand::{Rng, RngCore};

const SESSION_ID_BYTES: usize = 23;

/// Base64 of the hex rendering of 23 random bytes. Fresh for every call.
pub fn session_id() -> String {
    let mut raw = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut raw);
    base64::encode(hex::encode(raw))
}

pub fn random_ipv4() -> String {
    let mut rng = rand::thread_rng();
    let octets: [u8; 4] = rng.gen();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}
