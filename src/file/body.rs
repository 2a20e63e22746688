use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{BufMut, Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::poll_read_buf;

use crate::protocol::SendError;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Streams a whole file whose size was taken from `stat` when the response
/// was built.
///
/// The size already stands in the response's `Content-Length`, so the file
/// changing underneath is unrecoverable: ending short of the declared size,
/// or delivering bytes past it, fails the body and thereby the connection.
pub struct FileBody {
    file: File,
    declared: u64,
    total: u64,
    buf: BytesMut,
}

impl FileBody {
    pub fn new(file: File, declared: u64) -> Self {
        Self { file, declared, total: 0, buf: BytesMut::new() }
    }
}

impl Body for FileBody {
    type Data = Bytes;
    type Error = SendError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let me = self.get_mut();

        if me.total == me.declared {
            return Poll::Ready(None);
        }

        me.buf.reserve(READ_BUF_SIZE);
        let n = match ready!(poll_read_buf(Pin::new(&mut me.file), cx, &mut me.buf)) {
            Ok(n) => n as u64,
            Err(e) => return Poll::Ready(Some(Err(SendError::io(e)))),
        };

        if n == 0 {
            return Poll::Ready(Some(Err(SendError::invalid_body(format!(
                "file size changed: read {} of {} bytes",
                me.total, me.declared
            )))));
        }

        me.total += n;
        if me.total > me.declared {
            return Poll::Ready(Some(Err(SendError::invalid_body(format!(
                "file size changed: read {} of {} bytes",
                me.total, me.declared
            )))));
        }

        Poll::Ready(Some(Ok(Frame::data(me.buf.split().freeze()))))
    }

    fn is_end_stream(&self) -> bool {
        self.total == self.declared
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.declared - self.total)
    }
}

/// Streams the byte range `[start, end)` of a file.
///
/// The responder seeks the handle to `start` before constructing the body;
/// from there every read is capped at what the range still needs, so no
/// byte past `end` is ever pulled from the file.
pub struct RangeFileBody {
    file: File,
    remaining: u64,
    buf: BytesMut,
}

impl RangeFileBody {
    /// `file` must already be positioned at the start of the range;
    /// `length` is the number of bytes left to serve.
    pub fn new(file: File, length: u64) -> Self {
        Self { file, remaining: length, buf: BytesMut::new() }
    }
}

impl Body for RangeFileBody {
    type Data = Bytes;
    type Error = SendError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let me = self.get_mut();

        if me.remaining == 0 {
            return Poll::Ready(None);
        }

        let max = me.remaining.min(READ_BUF_SIZE as u64) as usize;
        me.buf.reserve(max);

        let n = {
            let dst = &mut me.buf.spare_capacity_mut()[..max];
            let mut read_buf = ReadBuf::uninit(dst);
            if let Err(e) = ready!(Pin::new(&mut me.file).poll_read(cx, &mut read_buf)) {
                return Poll::Ready(Some(Err(SendError::io(e))));
            }
            read_buf.filled().len()
        };

        if n == 0 {
            return Poll::Ready(Some(Err(SendError::invalid_body(format!(
                "file size changed: {} bytes of range missing",
                me.remaining
            )))));
        }

        // SAFETY: poll_read initialized the first n bytes of the spare
        // capacity through the ReadBuf
        unsafe { me.buf.advance_mut(n) };
        me.remaining -= n as u64;

        Poll::Ready(Some(Ok(Frame::data(me.buf.split().freeze()))))
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}
