use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::body::chunked_decoder::ChunkedState::*;
use crate::protocol::{ParseError, PayloadItem};

/// Decodes a chunked transfer coded body.
///
/// Byte-at-a-time state machine: a hexadecimal size line (extensions are
/// skipped), the chunk data streamed out as whatever contiguous slices are
/// buffered, the CRLF after the data, and for the zero-size chunk the final
/// CRLF. Trailer sections are not supported; a trailer field where the
/// final CRLF belongs is malformed framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    Size,
    SizeLws,
    Extension,
    SizeLf,
    Body,
    BodyCr,
    BodyLf,
    EndCr,
    EndLf,
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            match self.state.step(src, &mut self.remaining_size)? {
                (new_state, None) => {
                    self.state = new_state;
                }
                (new_state, Some(bytes)) => {
                    self.state = new_state;
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::invalid_body("unexpected eof in chunked body")),
        }
    }
}

impl ChunkedState {
    fn step(&self, src: &mut BytesMut, remaining_size: &mut u64) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match self {
            Size => ChunkedState::read_size(src, remaining_size),
            SizeLws => ChunkedState::read_size_lws(src),
            Extension => ChunkedState::read_extension(src),
            SizeLf => ChunkedState::read_size_lf(src, *remaining_size),
            Body => ChunkedState::read_body(src, remaining_size),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            EndCr => ChunkedState::read_end_cr(src),
            EndLf => ChunkedState::read_end_lf(src),
            End => Ok((End, None)),
        }
    }

    fn read_size(src: &mut BytesMut, chunk_size: &mut u64) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        macro_rules! or_overflow {
            ($e:expr) => {
                match $e {
                    Some(val) => val,
                    None => return Err(ParseError::invalid_body("chunk size overflow")),
                }
            };
        }

        let radix = 16;
        match src.get_u8() {
            b @ b'0'..=b'9' => {
                *chunk_size = or_overflow!(chunk_size.checked_mul(radix));
                *chunk_size = or_overflow!(chunk_size.checked_add((b - b'0') as u64));
            }
            b @ b'a'..=b'f' => {
                *chunk_size = or_overflow!(chunk_size.checked_mul(radix));
                *chunk_size = or_overflow!(chunk_size.checked_add((b + 10 - b'a') as u64));
            }
            b @ b'A'..=b'F' => {
                *chunk_size = or_overflow!(chunk_size.checked_mul(radix));
                *chunk_size = or_overflow!(chunk_size.checked_add((b + 10 - b'A') as u64));
            }
            b'\t' | b' ' => return Ok((SizeLws, None)),
            b';' => return Ok((Extension, None)),
            b'\r' => return Ok((SizeLf, None)),

            _ => return Err(ParseError::invalid_body("invalid chunk size line")),
        }

        Ok((Size, None))
    }

    fn read_size_lws(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            // LWS can follow the chunk size, but no more digits can come
            b'\t' | b' ' => Ok((SizeLws, None)),
            b';' => Ok((Extension, None)),
            b'\r' => Ok((SizeLf, None)),
            _ => Err(ParseError::invalid_body("invalid chunk size linear white space")),
        }
    }

    fn read_extension(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        // extensions are skipped up to the CRLF; a bare LF inside one is
        // rejected so a missing CR can't be smuggled past the size line
        match src.get_u8() {
            b'\r' => Ok((SizeLf, None)),
            b'\n' => Err(ParseError::invalid_body("chunk extension contains newline")),
            _ => Ok((Extension, None)),
        }
    }

    fn read_size_lf(src: &mut BytesMut, chunk_size: u64) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            b'\n' => {
                if chunk_size == 0 {
                    Ok((EndCr, None))
                } else {
                    Ok((Body, None))
                }
            }
            _ => Err(ParseError::invalid_body("invalid chunk size LF")),
        }
    }

    fn read_body(src: &mut BytesMut, chunk_size: &mut u64) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        if src.is_empty() {
            return Ok((Body, None));
        }

        if *chunk_size == 0 {
            return Ok((BodyCr, None));
        }

        let remaining = match *chunk_size {
            r if r > usize::MAX as u64 => usize::MAX,
            r => r as usize,
        };

        let read_size = std::cmp::min(remaining, src.len());

        *chunk_size -= read_size as u64;
        let bytes = src.split_to(read_size).freeze();

        if *chunk_size > 0 {
            Ok((Body, Some(bytes)))
        } else {
            Ok((BodyCr, Some(bytes)))
        }
    }

    fn read_body_cr(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            b'\r' => Ok((BodyLf, None)),
            _ => Err(ParseError::invalid_body("invalid chunk body CR")),
        }
    }

    fn read_body_lf(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            b'\n' => Ok((Size, None)),
            _ => Err(ParseError::invalid_body("invalid chunk body LF")),
        }
    }

    fn read_end_cr(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            b'\r' => Ok((EndLf, None)),
            _ => Err(ParseError::invalid_body("invalid chunk end CR")),
        }
    }

    fn read_end_lf(src: &mut BytesMut) -> Result<(ChunkedState, Option<Bytes>), ParseError> {
        match src.get_u8() {
            b'\n' => Ok((End, None)),
            _ => Err(ParseError::invalid_body("invalid chunk end LF")),
        }
    }
}
