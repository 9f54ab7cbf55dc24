//! Network client for the patch list and file bodies.
//!
//! The engine talks to the remote side only through the [`Transport`] trait so
//! tests can substitute scripted in-memory responses. [`HttpTransport`] is the
//! real implementation: one reqwest client with rustls, a fixed timeout and a
//! fixed user agent, shared by both request kinds. No retry logic lives here;
//! retrying is the engine's job.

mod error;
mod http;

pub use error::{NetError, NetResult};
pub use http::{decode_body, HttpTransport, NetworkConfig, DEFAULT_TIMEOUT_SECS, USER_AGENT};

use std::io::Read;
use std::sync::Arc;

/// An open response body.
///
/// Dropping the stream releases the underlying connection, so the body is
/// closed on every exit path of the reader loop.
pub type BodyStream = Box<dyn Read + Send>;

/// Remote access used by the sync engine.
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text, decompressing gzip/deflate.
    fn fetch_text(&self, url: &str) -> NetResult<String>;

    /// GET `url` and return the uncompressed body as a byte stream.
    fn open_stream(&self, url: &str) -> NetResult<BodyStream>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch_text(&self, url: &str) -> NetResult<String> {
        (**self).fetch_text(url)
    }

    fn open_stream(&self, url: &str) -> NetResult<BodyStream> {
        (**self).open_stream(url)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch_text(&self, url: &str) -> NetResult<String> {
        (**self).fetch_text(url)
    }

    fn open_stream(&self, url: &str) -> NetResult<BodyStream> {
        (**self).open_stream(url)
    }
}
