//! reqwest-backed transport.

use std::io::Read;
use std::time::Duration;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::StatusCode;

use super::error::{NetError, NetResult};
use super::{BodyStream, Transport};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
pub const USER_AGENT: &str = "LOCPatcher/2.0";

/// Settings shared by every request of one [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Connect/read timeout.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl NetworkConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTPS transport for the patch list and file bodies.
///
/// Compression is negotiated by hand for the patch list (`Accept-Encoding:
/// gzip, deflate`, decoded in [`decode_body`]) and refused for file bodies,
/// which are already-compressed `.pak` archives streamed straight to disk.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: NetworkConfig,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> NetResult<Self> {
        Self::with_config(NetworkConfig::default())
    }

    /// Create a transport with custom settings.
    pub fn with_config(config: NetworkConfig) -> NetResult<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NetError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Settings this transport was built with.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn send(&self, url: &str, accept_encoding: &str) -> NetResult<Response> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT_ENCODING, accept_encoding)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    NetError::transport(
                        url,
                        format!("timed out after {}s", self.config.timeout.as_secs()),
                    )
                } else {
                    NetError::transport(url, e)
                }
            })?;

        check_status(url, response.status())?;
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn fetch_text(&self, url: &str) -> NetResult<String> {
        let response = self.send(url, "gzip, deflate")?;

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_ascii_lowercase());

        let raw = response
            .bytes()
            .map_err(|e| NetError::transport(url, format!("read error: {}", e)))?;

        decode_body(url, encoding.as_deref(), &raw)
    }

    fn open_stream(&self, url: &str) -> NetResult<BodyStream> {
        let response = self.send(url, "identity")?;
        Ok(Box::new(response))
    }
}

fn check_status(url: &str, status: StatusCode) -> NetResult<()> {
    if status != StatusCode::OK {
        return Err(NetError::Status {
            url: url.to_string(),
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }
    Ok(())
}

/// Decompress a response body per its `Content-Encoding` and decode it as
/// UTF-8.
///
/// `deflate` is tried as zlib-wrapped first (what the header means per RFC
/// 9110) and then as a raw deflate stream, which some servers send instead.
/// Unknown encodings are passed through untouched.
pub fn decode_body(url: &str, encoding: Option<&str>, raw: &[u8]) -> NetResult<String> {
    let bytes = match encoding {
        Some("gzip") | Some("x-gzip") => inflate(GzDecoder::new(raw))
            .map_err(|e| NetError::decode(url, format!("gzip: {}", e)))?,
        Some("deflate") => inflate(ZlibDecoder::new(raw))
            .or_else(|_| inflate(DeflateDecoder::new(raw)))
            .map_err(|e| NetError::decode(url, format!("deflate: {}", e)))?,
        _ => raw.to_vec(),
    };

    String::from_utf8(bytes).map_err(|e| NetError::decode(url, e))
}

fn inflate(mut decoder: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
