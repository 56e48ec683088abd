use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use url::Url;

/// Connection settings shared by every Codal gateway.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub api_url: Url,
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid header value for {name}")]
    Header { name: &'static str },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to start http runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Thin wrapper around an async `reqwest` client so the gateways can stay
/// synchronous. Requests run one at a time on a current-thread runtime.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
    settings: HttpSettings,
}

impl HttpTransport {
    pub fn new(settings: HttpSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(&settings)?)
            .timeout(settings.timeout)
            .build()?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self {
            client,
            runtime,
            settings,
        })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Resolves a portal-relative link (`/Reports/...`, `DownloadFile.aspx?...`)
    /// against the base URL. Absolute links pass through.
    pub fn resolve(&self, link: &str) -> Option<String> {
        resolve_link(&self.settings.base_url, link)
    }
}

pub(crate) fn resolve_link(base: &Url, link: &str) -> Option<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }
    base.join(trimmed).ok().map(String::from)
}

fn default_headers(settings: &HttpSettings) -> Result<HeaderMap, TransportError> {
    let origin = settings.base_url.origin().ascii_serialization();
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&settings.user_agent)
            .map_err(|_| TransportError::Header { name: "User-Agent" })?,
    );
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(&origin).map_err(|_| TransportError::Header { name: "Origin" })?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(settings.base_url.as_str())
            .map_err(|_| TransportError::Header { name: "Referer" })?,
    );
    Ok(headers)
}
