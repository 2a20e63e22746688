//! HTTP connection handling.
//!
//! [`HttpConnection`] owns one accepted socket for its whole life: it
//! decodes requests off the read half, runs the handler, streams the
//! response onto the write half, and keeps the connection alive for the
//! next request on HTTP/1.1. Every exit path ends with the socket halves
//! dropped, which destroys the underlying stream.

mod http_connection;

pub use http_connection::HttpConnection;
