//! Static file responses.
//!
//! [`serve_file`] builds a whole-file or byte-range response for a
//! filesystem path; the bodies stream straight from the file handle with
//! exact size hints, so they are framed with `Content-Length`. The handle
//! is owned by the body and closed when the body is dropped, on every exit
//! path.

mod body;
mod responder;

pub use body::{FileBody, RangeFileBody};
pub use responder::serve_file;
