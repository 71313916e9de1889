use serde::Deserialize;

pub const DEFAULT_SALT: &str = "2zKzokBI4^26#oiP";
pub const DEFAULT_NO_TICKET_VALUE: &str = "XSV7%!5!AX2L8@vn";

/// Constants mixed into every checksum: a salt and the fragment used when the
/// call carries no ticket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChecksumPreset {
    pub salt: String,
    pub no_ticket_value: String,
}

impl ChecksumPreset {
    pub fn new(salt: impl Into<String>, no_ticket_value: impl Into<String>) -> Self {
        Self { salt: salt.into(), no_ticket_value: no_ticket_value.into() }
    }
}

impl Default for ChecksumPreset {
    fn default() -> Self {
        Self::new(DEFAULT_SALT, DEFAULT_NO_TICKET_VALUE)
    }
}
