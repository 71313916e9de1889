//! Client for the MovieStarPlanet AMF gateway.
//!
//! Calls travel as AMF remoting envelopes (`amf`). Each envelope carries an
//! integrity checksum over its arguments (`checksum`), authenticated calls
//! embed a freshly signed ticket header (`auth`), and the `gateway`
//! dispatcher sends them with retries. `client` wraps all of it behind a
//! logged-in session and typed endpoints.

pub mod amf;
pub mod auth;
pub mod checksum;
pub mod cli;
pub mod client;
pub mod gateway;
pub mod utils;

pub use auth::{AuthorizationTicket, TicketHeader, TicketValue};
pub use checksum::{checksum, CallArgument, ChecksumPreset};
pub use client::MspClient;
pub use gateway::{AmfResult, ClientConfig, Dispatcher, Server};
pub use utils::errors::{GatewayError, Result};
