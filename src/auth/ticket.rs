use std::fmt;
use std::str::FromStr;

use crate::utils::errors::{GatewayError, Result};

const MIN_FIELDS: usize = 6;

/// Session ticket issued by the gateway at login.
///
/// A comma separated token: field 0 is an opaque session id, field 1 the
/// numeric actor id, field 5 carries the suffix the checksum slices from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketValue {
    raw: String,
    actor_id: i64,
}

impl TicketValue {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() < MIN_FIELDS {
            return Err(GatewayError::InvalidTicket(format!(
                "expected at least {} fields, got {}",
                MIN_FIELDS,
                fields.len()
            )));
        }
        let actor_id = fields[1]
            .trim()
            .parse::<i64>()
            .map_err(|_| GatewayError::InvalidTicket(format!("actor id {:?} is not numeric", fields[1])))?;
        Ok(Self { raw, actor_id })
    }

    pub fn actor_id(&self) -> i64 {
        self.actor_id
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TicketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TicketValue {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
