use std::future::Future;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use crate::model::{self, Record};
use crate::utils;

pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/saaslabsco/frontend-assignment/refs/heads/master/frontend-assignment.json";

const USER_AGENT: &str = concat!("fundtable/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Setup,
    Network,
    Parse,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Setup => "setup error",
            FailureKind::Network => "network error",
            FailureKind::Parse => "parse error",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid dataset URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response body is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("response JSON does not match the record layout: {source}")]
    UnexpectedShape {
        #[source]
        source: serde_json::Error,
    },

    #[error("fetch was dropped before it settled")]
    Cancelled,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::InvalidUrl { .. }
            | FetchError::InvalidHeader { .. }
            | FetchError::HttpClientBuild { .. }
            | FetchError::ProxySetup { .. } => FailureKind::Setup,
            FetchError::Network { .. }
            | FetchError::Status { .. }
            | FetchError::Body { .. }
            | FetchError::Cancelled => FailureKind::Network,
            FetchError::InvalidJson { .. } | FetchError::UnexpectedShape { .. } => {
                FailureKind::Parse
            }
        }
    }

    fn from_decode(source: serde_json::Error) -> Self {
        if source.is_data() {
            FetchError::UnexpectedShape { source }
        } else {
            FetchError::InvalidJson { source }
        }
    }
}

/// Anything that can produce the full record collection in one call.
pub trait RecordSource {
    fn fetch_records(&self) -> impl Future<Output = Result<Vec<Record>, FetchError>> + Send;
}

/// Loading indicator shared between the table and whoever draws it.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises the flag until the returned guard is dropped.
    pub fn raise(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard { flag: self.clone() }
    }
}

#[must_use = "the loading flag is lowered as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard {
    flag: LoadingFlag,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub url: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub follow_redirects: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
            follow_redirects: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        let url = reqwest::Url::parse(options.url.trim()).map_err(|_| FetchError::InvalidUrl {
            url: options.url.clone(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl { url: options.url });
        }
        let client = build_client(&options, &url)?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl RecordSource for Fetcher {
    async fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        let url = self.url.to_string();
        debug!("fetching dataset from {url}");

        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| FetchError::Body {
            url: url.clone(),
            source: e,
        })?;
        debug!("received {} bytes from {url}", body.len());

        let records = model::parse_records(&body).map_err(FetchError::from_decode)?;
        info!("fetched {} records from {url}", records.len());
        Ok(records)
    }
}

fn is_loopback(url: &reqwest::Url) -> bool {
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

fn build_client(
    options: &FetchOptions,
    url: &reqwest::Url,
) -> Result<reqwest::Client, FetchError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
        let (name, value) =
            utils::parse_header(raw).map_err(|message| FetchError::InvalidHeader {
                header: raw.to_string(),
                message,
            })?;
        headers.insert(name, value);
    }

    let redirect_policy = if options.follow_redirects {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    let timeout = Duration::from_secs(options.timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect_policy)
        .timeout(timeout);

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    } else if is_loopback(url) {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| FetchError::HttpClientBuild { source: e })
}
