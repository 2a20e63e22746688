use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{ParseError, PayloadItem};

/// Decodes a body with no declared framing: everything up to the point
/// where the peer closes its side of the connection is body data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UntilCloseDecoder;

impl UntilCloseDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for UntilCloseDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        Ok(Some(PayloadItem::Chunk(src.split().freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Ok(Some(PayloadItem::Eof)),
        }
    }
}
