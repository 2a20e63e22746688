//! HTTP response header handling.
//!
//! The header portion of a response is the standard `http::Response` with an
//! empty body placeholder; the body is attached by the handler and framed by
//! the encoder.

use http::Response;

/// Type alias for HTTP response headers.
pub type ResponseHead = Response<()>;
