use std::mem::MaybeUninit;

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Request};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::ensure;
use crate::protocol::{ParseError, RequestHeader};

const MAX_HEADER_NUM: usize = 64;
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Incremental request-head parser.
///
/// Scans the buffered prefix for a complete header block. While the block
/// is incomplete the decoder asks for more bytes, failing once the prefix
/// reaches [`MAX_HEADER_BYTES`]. On success it consumes exactly the header
/// block from the buffer, leaving any body or pipelined bytes in place, and
/// also resolves which payload decoder the request body needs.
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadDecoder);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut req = httparse::Request::new(&mut []);
        let mut headers: [MaybeUninit<httparse::Header>; MAX_HEADER_NUM] =
            unsafe { MaybeUninit::uninit().assume_init() };

        let parsed_result = req.parse_with_uninit_headers(src, &mut headers).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                // compute the header byte ranges before split_to invalidates
                // the httparse borrows
                let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
                HeaderIndex::record(src, req.headers, &mut header_index);

                let version = match req.version {
                    Some(0) => http::Version::HTTP_10,
                    Some(1) => http::Version::HTTP_11,
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let mut header_builder = Request::builder()
                    .method(req.method.ok_or(ParseError::InvalidMethod)?)
                    .uri(req.path.ok_or(ParseError::InvalidUri)?)
                    .version(version);

                let header_count = req.headers.len();

                let header_bytes = src.split_to(body_offset).freeze();
                // headers_mut is None when the builder already holds an
                // invalid method or uri; body() below reports that
                if let Some(headers) = header_builder.headers_mut() {
                    headers.reserve(header_count);

                    for index in &header_index[..header_count] {
                        // safe to unwrap: httparse only accepts token
                        // characters in field names
                        let name = HeaderName::from_bytes(&header_bytes[index.name.0..index.name.1]).unwrap();

                        // SAFETY: httparse already checks header value is only
                        // visible ASCII bytes
                        let value = unsafe {
                            HeaderValue::from_maybe_shared_unchecked(
                                header_bytes.slice(index.value.0..index.value.1),
                            )
                        };

                        headers.append(name, value);
                    }
                }

                // method and uri validation is deferred by the builder to
                // this point
                let header = RequestHeader::from(header_builder.body(()).map_err(|_| ParseError::InvalidUri)?);
                let payload_decoder = parse_payload(&header)?;

                Ok(Some((header, payload_decoder)))
            }
            Status::Partial => {
                ensure!(src.len() < MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

const EMPTY_HEADER_INDEX_ARRAY: [HeaderIndex; MAX_HEADER_NUM] = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];

impl HeaderIndex {
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, indices) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            let name_end = name_start + header.name.len();
            indices.name = (name_start, name_end);
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            let value_end = value_start + header.value.len();
            indices.value = (value_start, value_end);
        }
    }
}

/// Resolves the payload decoder for a request from its framing headers.
///
/// - `Content-Length: n` gives a fixed-length body;
/// - otherwise `Transfer-Encoding` whose first token is `chunked` gives a
///   chunked body;
/// - otherwise the body runs until the peer closes the connection.
///
/// `GET` and `HEAD` requests must not carry a body at all: a positive
/// `Content-Length` or a chunked coding on one of them is rejected, and the
/// body is forced empty.
fn parse_payload(header: &RequestHeader) -> Result<PayloadDecoder, ParseError> {
    let headers = header.headers();

    let content_length = match headers.get(http::header::CONTENT_LENGTH) {
        Some(value) => {
            let cl_str = value.to_str().map_err(|_| ParseError::invalid_content_length("value is not visible ascii"))?;
            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not a decimal integer")))?;
            Some(length)
        }
        None => None,
    };

    let chunked = is_chunked(headers.get(http::header::TRANSFER_ENCODING));

    if header.body_forbidden() {
        ensure!(content_length.unwrap_or(0) == 0 && !chunked, ParseError::BodyNotAllowed);
        return Ok(PayloadDecoder::empty());
    }

    match content_length {
        Some(length) => Ok(PayloadDecoder::length(length)),
        None if chunked => Ok(PayloadDecoder::chunked()),
        None => Ok(PayloadDecoder::until_close()),
    }
}

fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    header_value
        .and_then(|value| value.to_str().ok())
        .and_then(|encodings| encodings.split(',').next())
        .map(|first_encoding| first_encoding.trim() == "chunked")
        .unwrap_or(false)
}
