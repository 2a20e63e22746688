use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use http::Version;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::writer::Writer;
use crate::protocol::{PayloadSize, ResponseHead, SendError};

/// Encodes a response head: status line, the handler's header fields in
/// order, and the framing header matching the declared payload size.
///
/// Framing is the encoder's job, not the handler's: a known length becomes
/// `Content-Length`, an unknown one `Transfer-Encoding: chunked`.
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, payload_size) = item;

        match head.version() {
            Version::HTTP_11 => {
                dst.put_slice(b"HTTP/1.1 ");
                dst.put_slice(head.status().as_str().as_bytes());
                dst.put_slice(b" ");
                dst.put_slice(head.status().canonical_reason().unwrap_or("Unknown Status Code").as_bytes());
                dst.put_slice(b"\r\n");
            }
            v => {
                error!(http_version = ?v, "unsupported response http version");
                return Err(SendError::io(io::Error::from(ErrorKind::Unsupported)));
            }
        }

        for (header_name, header_value) in head.headers().iter() {
            dst.put_slice(header_name.as_str().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_bytes());
            dst.put_slice(b"\r\n");
        }

        match payload_size {
            PayloadSize::Length(n) => write!(Writer(dst), "content-length: {n}\r\n").map_err(SendError::io)?,
            PayloadSize::Empty => dst.put_slice(b"content-length: 0\r\n"),
            PayloadSize::Chunked => dst.put_slice(b"transfer-encoding: chunked\r\n"),
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::{Response, StatusCode};

    use super::*;

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> BytesMut {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        dst
    }

    #[test]
    fn status_line_and_length_framing() {
        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();

        let dst = encode(head, PayloadSize::Length(13));
        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\ncontent-length: 13\r\n\r\n");
    }

    #[test]
    fn chunked_framing() {
        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();

        let dst = encode(head, PayloadSize::Chunked);
        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n");
    }

    #[test]
    fn empty_body_framing() {
        let head = Response::builder().status(StatusCode::NOT_FOUND).body(()).unwrap();

        let dst = encode(head, PayloadSize::Empty);
        assert_eq!(&dst[..], b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
    }

    #[test]
    fn handler_headers_precede_framing() {
        let head = Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header("Content-Range", "bytes 0-3/10")
            .body(())
            .unwrap();

        let dst = encode(head, PayloadSize::Length(3));
        assert_eq!(
            &dst[..],
            b"HTTP/1.1 206 Partial Content\r\ncontent-range: bytes 0-3/10\r\ncontent-length: 3\r\n\r\n"
        );
    }

    #[test]
    fn unknown_status_reason() {
        let head = Response::builder().status(599).body(()).unwrap();

        let dst = encode(head, PayloadSize::Empty);
        assert!(dst.starts_with(b"HTTP/1.1 599 Unknown Status Code\r\n"));
    }
}
