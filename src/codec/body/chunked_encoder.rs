use std::io::Write;

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::codec::writer::Writer;
use crate::protocol::{PayloadItem, SendError};

/// Encodes a body with chunked transfer coding: every non-empty chunk is
/// framed as `<hex-size>\r\n<data>\r\n` and end-of-stream as the zero-size
/// chunk `0\r\n\r\n`. Empty data chunks are suppressed so they cannot
/// terminate the stream early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl Encoder<PayloadItem> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }

                write!(Writer(dst), "{:X}\r\n", bytes.len()).map_err(SendError::io)?;
                dst.reserve(bytes.len() + 2);
                dst.extend_from_slice(&bytes[..]);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}
