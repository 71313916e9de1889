//! HTTP seam used by the dispatcher.
//!
//! The dispatcher only needs "POST these bytes with this proxy and timeout";
//! anything that can do that implements `Transport`. `ReqwestTransport` is
//! the production implementation; tests plug in scripted ones.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub body: Bytes,
    pub headers: Vec<(&'static str, String)>,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Failures below the HTTP layer. Any HTTP status, 5xx included, is a
/// successful exchange.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport. Keeps one pooled client per proxy so calls
/// through the same proxy share connections.
pub struct ReqwestTransport {
    verify_tls: bool,
    clients: Mutex<HashMap<Option<String>, reqwest::Client>>,
}

impl ReqwestTransport {
    pub fn new(verify_tls: bool) -> Self {
        Self { verify_tls, clients: Mutex::new(HashMap::new()) }
    }

    fn client_for(&self, proxy: Option<&String>) -> Result<reqwest::Client, TransportError> {
        let key = proxy.cloned();
        if let Some(client) = self.clients.lock().get(&key) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(!self.verify_tls);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| TransportError::Request(format!("bad proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| TransportError::Request(e.to_string()))?;
        debug!(proxy = ?key, "created http client");
        self.clients.lock().insert(key, client.clone());
        Ok(client)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(true)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self.client_for(request.proxy.as_ref())?;
        let mut builder = client.post(&request.url).timeout(request.timeout).body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        Ok(TransportResponse { status, body })
    }
}
