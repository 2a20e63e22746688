//! Request and response payload codecs.
//!
//! Decoders pull a request body out of the receive buffer according to its
//! framing: a fixed `Content-Length`, chunked transfer coding, or
//! everything until the peer closes. Encoders produce the matching wire
//! form on the response side. All of them speak
//! [`PayloadItem`](crate::protocol::PayloadItem): non-empty data chunks
//! terminated by a single `Eof`.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod until_close_decoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;

pub(crate) use chunked_decoder::ChunkedDecoder;
pub(crate) use chunked_encoder::ChunkedEncoder;
pub(crate) use length_decoder::LengthDecoder;
pub(crate) use length_encoder::LengthEncoder;
pub(crate) use until_close_decoder::UntilCloseDecoder;
