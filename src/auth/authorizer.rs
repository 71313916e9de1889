use md5::{Digest, Md5};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{TicketHeader, TicketValue};
use crate::utils::errors::{GatewayError, Result};

/// Builds the replay-resistant ticket header for authenticated calls.
///
/// The marking counter is strictly increasing for the lifetime of the
/// instance: it is never reset, not even when the ticket is replaced.
#[derive(Debug, Default)]
pub struct AuthorizationTicket {
    ticket: RwLock<Option<TicketValue>>,
    marking_id: Mutex<u64>,
}

impl AuthorizationTicket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(ticket: TicketValue) -> Self {
        Self {
            ticket: RwLock::new(Some(ticket)),
            marking_id: Mutex::new(0),
        }
    }

    pub fn set_ticket(&self, ticket: TicketValue) {
        *self.ticket.write() = Some(ticket);
    }

    pub fn ticket(&self) -> Option<TicketValue> {
        self.ticket.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.ticket.read().is_some()
    }

    /// Last marking id handed out (0 before the first build).
    pub fn marking_id(&self) -> u64 {
        *self.marking_id.lock()
    }

    /// Consume one marking id and sign it into a fresh header.
    /// Must be called once per outgoing authenticated call.
    pub fn build(&self) -> Result<TicketHeader> {
        let ticket = self.ticket.read().clone().ok_or(GatewayError::AuthenticationRequired)?;

        let marking_id = {
            let mut counter = self.marking_id.lock();
            *counter += 1;
            *counter
        };

        let local = marking_id.to_string();
        let md5hex = hex::encode(Md5::digest(local.as_bytes()));
        let value = format!("{}{}{}", ticket.as_str(), md5hex, hex::encode(local.as_bytes()));
        debug!(marking_id, "built ticket header");
        Ok(TicketHeader::new(value, marking_id))
    }
}
