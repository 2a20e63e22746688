use bytes::Bytes;

/// A decoded or to-be-encoded HTTP message part: the header, or one piece
/// of the payload.
#[derive(Debug)]
pub enum Message<H> {
    Header(H),
    Payload(PayloadItem),
}

impl<H> Message<H> {
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Header(_) => None,
            Message::Payload(payload_item) => Some(payload_item),
        }
    }
}

/// One pull from a body: a non-empty chunk of data, or end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    Chunk(Bytes),
    Eof,
}

impl PayloadItem {
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// Declared size of a response payload, derived from the body's size hint.
/// Drives the framing header the encoder adds: a known length becomes
/// `Content-Length`, an unknown length becomes `Transfer-Encoding: chunked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSize {
    Length(u64),
    Chunked,
    Empty,
}

impl PayloadSize {
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }
}
