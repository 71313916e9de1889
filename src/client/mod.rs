//! Session-holding client and the typed records its endpoints return.

pub mod entities;
pub mod msp;

pub use entities::{Actor, AwardData, Autograph, FromAmf, LoginStatus, NebulaLoginStatus, PiggyBank, SearchActor};
pub use msp::{MspClient, Session};
