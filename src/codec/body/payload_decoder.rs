use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::{ChunkedDecoder, LengthDecoder, UntilCloseDecoder};
use crate::protocol::{ParseError, PayloadItem};

/// Unified decoder for a request body, covering the three wire framings:
/// fixed `Content-Length`, chunked transfer coding, and read-until-close.
/// The empty body is a zero-length fixed framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    UntilClose(UntilCloseDecoder),
}

impl PayloadDecoder {
    /// Creates a decoder for a request with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(0)) }
    }

    /// Creates a chunked transfer coding decoder.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a fixed-length decoder.
    pub fn length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a decoder that reads until the peer closes the connection.
    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose(UntilCloseDecoder::new()) }
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            Kind::Length(decoder) => decoder.is_empty(),
            _ => false,
        }
    }

    pub fn is_length(&self) -> bool {
        matches!(&self.kind, Kind::Length(_))
    }

    pub fn is_chunked(&self) -> bool {
        matches!(&self.kind, Kind::Chunked(_))
    }

    pub fn is_until_close(&self) -> bool {
        matches!(&self.kind, Kind::UntilClose(_))
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::UntilClose(decoder) => decoder.decode(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode_eof(src),
            Kind::Chunked(decoder) => decoder.decode_eof(src),
            Kind::UntilClose(decoder) => decoder.decode_eof(src),
        }
    }
}
