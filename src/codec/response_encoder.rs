use std::io;
use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadSize, ResponseHead, SendError};

/// Encodes the response side of a connection: a head followed by its
/// payload items, terminated by `Eof`, then the next head.
///
/// Encoding a head arms the payload encoder that matches the head's
/// declared payload size; the pairing is enforced so a response can never
/// interleave with another one's body.
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Drops the pending payload phase of the response whose head was just
    /// encoded. Used for `HEAD` responses: the head carries the real
    /// framing headers, but no body bytes (and no chunked terminator) ever
    /// follow.
    pub fn skip_payload(&mut self) {
        self.payload_encoder.take();
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, payload_encoder: None }
    }
}

impl Encoder<Message<(ResponseHead, PayloadSize)>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, PayloadSize)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(SendError::io(io::Error::from(ErrorKind::InvalidInput)));
                }

                self.payload_encoder = Some(payload_encoder_for(payload_size));
                self.header_encoder.encode((head, payload_size), dst)
            }

            Message::Payload(payload_item) => {
                let payload_encoder = match &mut self.payload_encoder {
                    Some(encoder) => encoder,
                    None => {
                        error!("expect response head but receive payload item");
                        return Err(SendError::io(io::Error::from(ErrorKind::InvalidInput)));
                    }
                };

                let result = payload_encoder.encode(payload_item, dst);

                if payload_encoder.is_finish() {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}

fn payload_encoder_for(payload_size: PayloadSize) -> PayloadEncoder {
    match payload_size {
        PayloadSize::Length(size) => PayloadEncoder::length(size),
        PayloadSize::Chunked => PayloadEncoder::chunked(),
        PayloadSize::Empty => PayloadEncoder::empty(),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{Response, StatusCode};

    use crate::protocol::PayloadItem;

    use super::*;

    #[test]
    fn full_fixed_length_response() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Length(13))), &mut dst).unwrap();
        encoder.encode(Message::Payload(PayloadItem::Chunk(Bytes::from_static(b"hello world.\n"))), &mut dst).unwrap();
        encoder.encode(Message::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\ncontent-length: 13\r\n\r\nhello world.\n");

        // a second response may follow on the same connection
        let head = Response::builder().status(StatusCode::NO_CONTENT).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Empty)), &mut dst).unwrap();
    }

    #[test]
    fn full_chunked_response() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Chunked)), &mut dst).unwrap();
        encoder.encode(Message::Payload(PayloadItem::Chunk(Bytes::from_static(b"HelloWorld!"))), &mut dst).unwrap();
        encoder.encode(Message::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\nB\r\nHelloWorld!\r\n0\r\n\r\n"
        );
    }

    #[test]
    fn head_before_previous_body_finished_is_rejected() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Length(5))), &mut dst).unwrap();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        assert!(encoder.encode(Message::Header((head, PayloadSize::Empty)), &mut dst).is_err());
    }

    #[test]
    fn skip_payload_allows_next_head() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Length(13))), &mut dst).unwrap();

        encoder.skip_payload();

        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        encoder.encode(Message::Header((head, PayloadSize::Empty)), &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            b"HTTP/1.1 200 OK\r\ncontent-length: 13\r\n\r\nHTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n"
        );
    }
}
