use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::checksum::ChecksumPreset;
use crate::utils::errors::{GatewayError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Client-wide settings. Every field has a default, so a TOML file only
/// needs the keys it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub timeout_secs: u64,
    /// Reject invalid gateway certificates.
    pub verify_tls: bool,
    /// Force `https://` on gateway urls (otherwise force `http://`).
    pub ensure_https: bool,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Client-wide proxy. When set it wins over any per-call proxy.
    pub proxy: Option<String>,
    pub user_agent: String,
    /// `True-Client-IP` value; a random IPv4 is picked per client when unset.
    pub client_ip: Option<String>,
    pub raise_on_timeout: bool,
    pub raise_on_request_error: bool,
    /// Write real byte lengths into the envelope instead of zero.
    pub strict_envelope: bool,
    pub preset: ChecksumPreset,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            verify_tls: true,
            ensure_https: true,
            retry_attempts: 2,
            retry_delay_ms: 0,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client_ip: None,
            raise_on_timeout: false,
            raise_on_request_error: false,
            strict_envelope: false,
            preset: ChecksumPreset::default(),
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|e| GatewayError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
