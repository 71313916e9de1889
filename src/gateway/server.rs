use std::fmt;
use std::str::FromStr;

use crate::utils::errors::GatewayError;

/// Regional gateway, rendered lowercase in `ws-{server}.mspapis.com`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Server {
    Us,
    Gb,
    De,
    Fr,
    Tr,
    Se,
    Nl,
    Fi,
    No,
    Dk,
    Ca,
    Au,
    Pl,
    Nz,
    Ie,
    Es,
}

impl Server {
    pub const ALL: [Server; 16] = [
        Server::Us,
        Server::Gb,
        Server::De,
        Server::Fr,
        Server::Tr,
        Server::Se,
        Server::Nl,
        Server::Fi,
        Server::No,
        Server::Dk,
        Server::Ca,
        Server::Au,
        Server::Pl,
        Server::Nz,
        Server::Ie,
        Server::Es,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Server::Us => "us",
            Server::Gb => "gb",
            Server::De => "de",
            Server::Fr => "fr",
            Server::Tr => "tr",
            Server::Se => "se",
            Server::Nl => "nl",
            Server::Fi => "fi",
            Server::No => "no",
            Server::Dk => "dk",
            Server::Ca => "ca",
            Server::Au => "au",
            Server::Pl => "pl",
            Server::Nz => "nz",
            Server::Ie => "ie",
            Server::Es => "es",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Server {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        // the UK gateway is also known by its ISO alias
        let code = if code == "uk" { "gb".to_string() } else { code };
        Server::ALL
            .iter()
            .copied()
            .find(|server| server.code() == code)
            .ok_or_else(|| GatewayError::Config(format!("unknown server {:?}", s)))
    }
}
