//! Session ticket handling.
//!
//! - `TicketValue`: the raw ticket issued at login
//! - `TicketHeader`: one signed header, embedded as a call parameter
//! - `AuthorizationTicket`: owns the ticket and the marking counter

pub mod authorizer;
pub mod header;
pub mod ticket;

pub use authorizer::AuthorizationTicket;
pub use header::TicketHeader;
pub use ticket::TicketValue;
