//! Proxy and url resolution for gateway calls.

use super::Server;

pub const GATEWAY_PATH: &str = "Gateway.aspx";

/// The client-wide proxy, when configured, wins over the per-call one.
pub fn resolve_proxy(client: Option<&str>, per_call: Option<&str>) -> Option<String> {
    client.or(per_call).map(normalize_proxy)
}

/// Bare `host:port` proxies get an `http://` scheme.
pub fn normalize_proxy(proxy: &str) -> String {
    if proxy.starts_with("http") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}

pub fn gateway_url(server: &Server, method: &str, ensure_https: bool) -> String {
    enforce_scheme(
        &format!("https://ws-{}.mspapis.com/{}?method={}", server, GATEWAY_PATH, method),
        ensure_https,
    )
}

/// Rewrite the scheme to `https://` when `ensure_https`, to `http://` otherwise.
pub fn enforce_scheme(url: &str, ensure_https: bool) -> String {
    if ensure_https {
        url.replace("http://", "https://")
    } else {
        url.replace("https://", "http://")
    }
}
