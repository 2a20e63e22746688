use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::ensure;
use crate::protocol::{PayloadItem, SendError};

/// Encodes a body with `Content-Length` framing: chunks pass through raw.
///
/// The declared length is a promise to the peer, so a body that tries to
/// write past it, or ends short of it, is an error rather than silent
/// framing corruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
    written: u64,
    received_eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length, written: 0, received_eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.received_eof
    }
}

impl Encoder<PayloadItem> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }

                self.written += bytes.len() as u64;
                ensure!(
                    self.written <= self.length,
                    SendError::invalid_body(format!(
                        "body longer than Content-Length: {} > {}",
                        self.written, self.length
                    ))
                );

                dst.extend_from_slice(&bytes[..]);
                Ok(())
            }
            PayloadItem::Eof => {
                ensure!(
                    self.written == self.length,
                    SendError::invalid_body(format!(
                        "body shorter than Content-Length: {} < {}",
                        self.written, self.length
                    ))
                );
                self.received_eof = true;
                Ok(())
            }
        }
    }
}
