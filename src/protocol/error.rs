//! Error types for HTTP protocol handling.
//!
//! [`HttpError`] is the top-level error at the connection boundary and wraps
//! either a [`ParseError`] (request side) or a [`SendError`] (response side).
//! Parse errors additionally know which HTTP status a synthesized error
//! response should carry; transport errors carry none, since no response is
//! attempted once the transport has failed.

use std::io;

use http::StatusCode;
use thiserror::Error;

/// The top-level error type for HTTP operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Errors that occur during request parsing and processing
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    /// Errors that occur during response generation and sending
    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors that occur while parsing and reading HTTP requests.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Header block exceeds the maximum allowed size
    #[error("header is too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    /// Number of header fields exceeds the maximum allowed
    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    /// Malformed request line or header field
    #[error("bad field: {reason}")]
    InvalidHeader { reason: String },

    /// Unsupported HTTP version
    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    /// Invalid or unsupported HTTP method
    #[error("invalid http method")]
    InvalidMethod,

    /// Invalid URI format
    #[error("invalid http uri")]
    InvalidUri,

    /// Invalid Content-Length header
    #[error("bad Content-Length: {reason}")]
    InvalidContentLength { reason: String },

    /// A body on a request whose method forbids one
    #[error("HTTP body not allowed")]
    BodyNotAllowed,

    /// The peer closed the connection in the middle of a request
    #[error("unexpected EOF")]
    UnexpectedEof,

    /// Malformed body framing
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    /// Transport error while reading
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// Creates a new TooLargeHeader error
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    /// Creates a new TooManyHeaders error
    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    /// Creates a new InvalidHeader error
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    /// Creates a new InvalidBody error
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    /// Creates a new InvalidContentLength error
    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    /// Creates a new I/O error
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The status a synthesized error response should carry, or `None` for
    /// transport errors where no response is attempted.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::TooLargeHeader { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            Self::Io { .. } => None,
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

/// Errors that occur while encoding and sending HTTP responses.
#[derive(Error, Debug)]
pub enum SendError {
    /// Invalid response body
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    /// Transport error while writing
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    /// Creates a new InvalidBody error
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    /// Creates a new I/O error
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
