//! Exit IP lookup through Tor's SOCKS port.

use std::error::Error as StdError;

use reqwest::{Client, Proxy};

use crate::config::EgressConfig;
use crate::error::{MojenxError, Result};

#[derive(Debug, Clone)]
pub struct EgressChecker {
    config: EgressConfig,
}

impl EgressChecker {
    pub fn new(config: EgressConfig) -> Self {
        Self { config }
    }

    /// Ask the echo endpoint, via the SOCKS proxy on `socks_port`, which
    /// address our traffic appears from.
    pub async fn exit_ip(&self, socks_port: u16) -> Result<String> {
        let host = self.config.echo_host.as_str();
        let client = self.client(socks_port)?;
        let url = format!("http://{host}:{}/", self.config.echo_port);

        let mut response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| connect_error(host, &e))?;

        let limit = self.config.max_response_bytes;
        let mut body = Vec::with_capacity(limit.min(8192));
        while body.len() < limit {
            let Some(chunk) = response.chunk().await.map_err(|e| connect_error(host, &e))? else {
                break;
            };
            let take = chunk.len().min(limit - body.len());
            body.extend_from_slice(&chunk[..take]);
        }

        let ip = last_body_line(&String::from_utf8_lossy(&body));
        tracing::info!(socks_port, status = %response.status(), ip = %ip, "exit IP checked");
        Ok(ip)
    }

    /// One-shot client. Every request, DNS included, goes through the proxy.
    fn client(&self, socks_port: u16) -> Result<Client> {
        let proxy = Proxy::all(format!("socks5h://127.0.0.1:{socks_port}"))
            .map_err(|e| MojenxError::Connect(format!("proxy 127.0.0.1:{socks_port}: {e}")))?;

        Client::builder()
            .proxy(proxy)
            .connect_timeout(self.config.dial_timeout())
            .user_agent(concat!("mojenx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MojenxError::Connect(format!("http client: {e}")))
    }
}

fn connect_error(host: &str, error: &reqwest::Error) -> MojenxError {
    // reqwest's Display stops at the outermost layer; the proxy refusal sits below it.
    let mut detail = error.to_string();
    let mut source = StdError::source(error);
    while let Some(inner) = source {
        detail.push_str(": ");
        detail.push_str(&inner.to_string());
        source = inner.source();
    }
    MojenxError::Connect(format!("{host}: {detail}"))
}

/// Last non-blank line of the response body, trimmed.
///
/// The endpoint is expected to answer with the bare address. Nothing checks
/// that it did: a different body shape yields whatever its last line is.
pub fn last_body_line(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}
