/// Signed per-call authentication header. Travels inside the request body
/// as an anonymous object `{Ticket: value, anyAttribute: null}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketHeader {
    value: String,
    marking_id: u64,
}

impl TicketHeader {
    pub fn new(value: String, marking_id: u64) -> Self {
        Self { value, marking_id }
    }

    /// `ticket + md5hex(counter) + hex(counter)`
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Counter value consumed when this header was built.
    pub fn marking_id(&self) -> u64 {
        self.marking_id
    }
}
