//! Envelope assembly and the retrying send loop.

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::routing::{gateway_url, resolve_proxy};
use super::session::{random_ipv4, session_id};
use super::transport::{ReqwestTransport, Transport, TransportError, TransportRequest};
use super::{AmfResult, ClientConfig, Server};
use crate::amf::{encode_envelope, Header, Request, RequestEnvelope};
use crate::checksum::{checksum, CallArgument};
use crate::utils::errors::{GatewayError, Result};

pub const REFERER: &str = "app:/cache/t1.bin/[[DYNAMIC]]/2";
pub const CONTENT_TYPE: &str = "application/x-amf";
/// Response id the gateway answers the single call under.
pub const RESPONSE_ID: &str = "/1";

/// Sends remoting calls to the gateway.
///
/// Every call gets a fresh envelope: a random `sessionID`, `needClassName`
/// false and the checksum of its params as `id`. Transport failures are
/// retried `retry_attempts + 1` times with `retry_delay` in between, followed
/// by one last attempt, so a permanently failing call is tried
/// `retry_attempts + 2` times. HTTP responses are never retried, whatever
/// their status.
pub struct Dispatcher<T: Transport = ReqwestTransport> {
    transport: Arc<T>,
    config: ClientConfig,
    client_ip: String,
}

impl Dispatcher<ReqwestTransport> {
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.verify_tls));
        Self::new(config, transport)
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: ClientConfig, transport: Arc<T>) -> Self {
        let client_ip = config.client_ip.clone().unwrap_or_else(random_ipv4);
        Self { transport, config, client_ip }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// `True-Client-IP` sent with every request of this dispatcher.
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn build_envelope(&self, method: &str, params: Vec<CallArgument>) -> RequestEnvelope {
        let id = checksum(&params, &self.config.preset);
        RequestEnvelope::new()
            .header(Header::new("sessionID", session_id()))
            .header(Header::new("needClassName", false))
            .header(Header::new("id", id))
            .request(Request {
                target: method.to_string(),
                response: RESPONSE_ID.to_string(),
                params,
            })
    }

    fn request_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.config.user_agent.clone()),
            ("Referer", REFERER.to_string()),
            ("Content-Type", CONTENT_TYPE.to_string()),
            ("True-Client-IP", self.client_ip.clone()),
        ]
    }

    /// Send `method(params)` to `server`. `proxy` is only used when no
    /// client-wide proxy is configured.
    ///
    /// Exhausted retries give `AmfResult::failed()`, or an error when the
    /// matching `raise_on_*` flag is set.
    pub async fn send(
        &self,
        server: &Server,
        method: &str,
        params: Vec<CallArgument>,
        proxy: Option<&str>,
    ) -> Result<AmfResult> {
        let proxy = resolve_proxy(self.config.proxy.as_deref(), proxy);
        let url = gateway_url(server, method, self.config.ensure_https);
        let envelope = self.build_envelope(method, params);
        let body = encode_envelope(&envelope, self.config.strict_envelope)?;

        let request = TransportRequest {
            url,
            body,
            headers: self.request_headers(),
            proxy,
            timeout: self.config.timeout(),
        };

        let retry_budget = self.config.retry_attempts + 1;
        for attempt in 1..=retry_budget {
            match self.attempt(&request, attempt).await {
                Ok(result) => return Ok(result),
                Err(_) => sleep(self.config.retry_delay()).await,
            }
        }

        match self.attempt(&request, retry_budget + 1).await {
            Ok(result) => Ok(result),
            Err(err) => self.surface(&request.url, err),
        }
    }

    async fn attempt(
        &self,
        request: &TransportRequest,
        attempt: u32,
    ) -> std::result::Result<AmfResult, TransportError> {
        match self.transport.post(request.clone()).await {
            Ok(response) => {
                debug!(url = %request.url, status = response.status, attempt, "gateway responded");
                Ok(AmfResult::new(response.body, response.status))
            }
            Err(err) => {
                if err.is_timeout() {
                    error!(url = %request.url, attempt, "gateway timeout");
                } else {
                    warn!(url = %request.url, attempt, error = %err, "gateway request failed");
                }
                Err(err)
            }
        }
    }

    fn surface(&self, url: &str, err: TransportError) -> Result<AmfResult> {
        match err {
            TransportError::Timeout if self.config.raise_on_timeout => {
                Err(GatewayError::Timeout { url: url.to_string() })
            }
            TransportError::Connect(msg) | TransportError::Request(msg)
                if self.config.raise_on_request_error =>
            {
                Err(GatewayError::Transport(msg))
            }
            _ => Ok(AmfResult::failed()),
        }
    }
}
