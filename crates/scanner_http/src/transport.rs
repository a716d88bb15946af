// crates/scanner_http/src/transport.rs
//! HTTP probe transport built on reqwest

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client, Method, Proxy};
use std::time::Duration;
use tracing::{instrument, trace};

use bugscan_common::{get_url, HttpResponse, ProbeError, ProbeTask, ScanConfig, Transport};
use crate::error::to_probe_error;

/// Direct HTTP transport: one request, no redirect following.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    uri: Option<String>,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::from_config(&ScanConfig::default())
    }

    /// Build the client from the scan configuration (timeout, proxy, uri).
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .connect_timeout(config.timeout);

        builder = match config.proxy.as_deref() {
            Some(proxy) => {
                let proxy_url = normalize_proxy(proxy);
                builder.proxy(
                    Proxy::all(&proxy_url).with_context(|| format!("Invalid proxy: {}", proxy))?,
                )
            }
            // Ignore HTTP_PROXY and friends so probes always go direct
            None => builder.no_proxy(),
        };

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            timeout: config.timeout,
            uri: config.uri.clone(),
        })
    }

    /// Per-request budget this transport enforces.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL probed for a task.
    pub fn url_for(&self, task: &ProbeTask) -> String {
        get_url(&task.host, task.port, self.uri.as_deref())
    }
}

/// Accept `host:port` as well as full proxy URLs.
fn normalize_proxy(proxy: &str) -> String {
    let proxy = proxy.trim();
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}

fn header_value(headers: &header::HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, task), fields(task = %task))]
    async fn send(&self, task: &ProbeTask) -> Result<HttpResponse, ProbeError> {
        let url = self.url_for(task);
        let method = Method::from_bytes(task.method.as_bytes())
            .map_err(|e| ProbeError::connection(format!("invalid method {}: {}", task.method, e)))?;

        let resp = self
            .client
            .request(method, &url)
            .send()
            .await
            .map_err(to_probe_error)?;

        let status = resp.status().as_u16();
        let server = header_value(resp.headers(), header::SERVER);
        let location = header_value(resp.headers(), header::LOCATION);
        trace!(%url, status, "response");

        Ok(HttpResponse {
            status,
            server,
            location,
        })
    }

    fn name(&self) -> &str {
        "HTTP Direct Transport"
    }
}
