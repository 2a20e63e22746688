//! HTTP request header handling.
//!
//! Wraps the standard `http::Request` type so the codec can hand a parsed
//! header around before a body is attached to it.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// A parsed request line plus headers, without a body.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|_| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Whether the request method forbids a body on the wire.
    ///
    /// `GET` and `HEAD` requests must not carry a body; a `Content-Length`
    /// greater than zero or a chunked transfer coding on one of these is a
    /// protocol error.
    pub fn body_forbidden(&self) -> bool {
        matches!(self.method(), &Method::GET | &Method::HEAD)
    }
}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
