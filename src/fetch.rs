//! Remote fetch client used by the URL resolver: scheme recognition,
//! transport selection, and byte-size policing for remote image bodies.

use reqwest::redirect;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::GatewayError;
use crate::policy::{FETCH_CONNECT_TIMEOUT, FETCH_READ_TIMEOUT, MAX_IMAGE_BYTES};

/// Where a fetch will connect, recovered from the raw URL string.
///
/// Scheme is restricted to http/https, the port defaults to 80/443, and the
/// path defaults to `/`. The query string stays attached to the path since
/// it is part of the request target.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FetchTarget {
    pub use_tls: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl FetchTarget {
    fn to_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

/// Recognize the scheme prefix first; everything else about the URL is only
/// examined once the scheme is known to be supported.
pub(crate) fn parse_target(raw: &str) -> Result<FetchTarget, GatewayError> {
    let use_tls = if raw.starts_with("https://") {
        true
    } else if raw.starts_with("http://") {
        false
    } else {
        return Err(GatewayError::UnsupportedScheme);
    };

    let url = Url::parse(raw).map_err(|e| GatewayError::FetchFailed(format!("invalid URL: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| GatewayError::FetchFailed("URL has no host".into()))?
        .to_string();
    let port = url.port().unwrap_or(if use_tls { 443 } else { 80 });

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(FetchTarget {
        use_tls,
        host,
        port,
        path,
    })
}

/// HTTP client for fetching remote images.
///
/// TLS capability is an explicit flag fixed at construction: when absent,
/// https URLs are refused up front instead of failing mid-handshake.
pub struct FetchClient {
    client: reqwest::Client,
    tls: bool,
}

impl FetchClient {
    /// Build a client with the capability implied by the compiled features.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_capability(cfg!(feature = "tls"))
    }

    pub fn with_capability(tls: bool) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(FETCH_CONNECT_TIMEOUT)
            .timeout(FETCH_READ_TIMEOUT)
            .redirect(redirect::Policy::limited(10))
            .build()?;
        Ok(FetchClient { client, tls })
    }

    pub fn tls_capable(&self) -> bool {
        self.tls
    }

    /// Fetch the body behind `raw_url`, enforcing the payload ceiling before
    /// the bytes are handed on for decoding.
    pub async fn fetch(&self, raw_url: &str) -> Result<Vec<u8>, GatewayError> {
        let target = parse_target(raw_url)?;
        if target.use_tls && !self.tls {
            return Err(GatewayError::TlsUnavailable);
        }

        let url = target.to_url();
        debug!(%url, "fetching remote image");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::FetchFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        // A declared length over the cap short-circuits before the body is
        // drained; undeclared lengths are checked after.
        if let Some(declared) = response.content_length() {
            if declared as usize > MAX_IMAGE_BYTES {
                return Err(GatewayError::PayloadTooLarge { what: "Image" });
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::FetchFailed(e.to_string()))?;
        if body.len() > MAX_IMAGE_BYTES {
            return Err(GatewayError::PayloadTooLarge { what: "Image" });
        }

        Ok(body.to_vec())
    }
}
