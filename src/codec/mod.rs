//! HTTP codec module for encoding and decoding HTTP messages.
//!
//! The decode side turns bytes pulled from the socket into a stream of
//! [`Message`](crate::protocol::Message)s: one header, then the payload
//! items of that request's body, then the next header. The encode side
//! turns a response head plus payload items back into wire bytes, adding
//! the framing header (`Content-Length` or `Transfer-Encoding: chunked`)
//! that matches the declared payload size.

pub mod body;
pub mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;

pub(crate) mod writer {
    use bytes::{BufMut, BytesMut};
    use std::io;

    /// Adapter so `write!` can format numbers straight into a `BytesMut`.
    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
