//! The handler-facing request body.
//!
//! The connection task owns the framed stream; the handler owns [`ReqBody`].
//! Every `poll_frame` on the body issues one pull request over a rendezvous
//! channel and the connection task answers it with exactly one decoded
//! [`PayloadItem`]. The connection therefore never reads ahead of the
//! handler: bytes are pulled from the socket only when somebody asks for
//! them.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, Stream, StreamExt};

use http_body::{Body, Frame, SizeHint};
use tracing::info;

use crate::protocol::{Message, ParseError, PayloadItem, RequestHeader};

pub struct ReqBody {
    signal: mpsc::Sender<oneshot::Sender<PayloadItem>>,
    receiving: Option<oneshot::Receiver<PayloadItem>>,
    eof: bool,
}

impl ReqBody {
    fn new(signal: mpsc::Sender<oneshot::Sender<PayloadItem>>) -> Self {
        Self { signal, receiving: None, eof: false }
    }

    /// Builds the body/sender pair for one request. The sender side stays
    /// with the connection task and forwards payload items decoded from
    /// `payload_stream`.
    pub fn body_channel<S>(payload_stream: &mut S) -> (ReqBody, ReqBodySender<S>)
    where
        S: Stream + Unpin,
    {
        let (tx, receiver) = mpsc::channel(16);

        let req_body = ReqBody::new(tx);

        let body_sender = ReqBodySender { payload_stream, receiver, eof: false, detached: false };

        (req_body, body_sender)
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        // end-of-stream is latched: once the body has ended every further
        // poll reports the end again instead of issuing a new pull
        if self.eof {
            return Poll::Ready(None);
        }

        loop {
            if let Some(oneshot_receiver) = &mut self.receiving {
                return match ready!(oneshot_receiver.poll_unpin(cx)) {
                    Ok(PayloadItem::Chunk(bytes)) => {
                        self.receiving.take();
                        Poll::Ready(Some(Ok(Frame::data(bytes))))
                    }
                    Ok(PayloadItem::Eof) => {
                        self.receiving.take();
                        self.eof = true;
                        Poll::Ready(None)
                    }
                    Err(_) => {
                        self.receiving.take();
                        Poll::Ready(Some(Err(ParseError::invalid_body("body pull canceled"))))
                    }
                };
            }

            match ready!(self.signal.poll_ready(cx)) {
                Ok(_) => {
                    let (tx, rx) = oneshot::channel();
                    match self.signal.start_send(tx) {
                        Ok(_) => {
                            self.receiving = Some(rx);
                            continue;
                        }
                        Err(e) => return Poll::Ready(Some(Err(ParseError::invalid_body(e)))),
                    }
                }
                Err(e) => return Poll::Ready(Some(Err(ParseError::invalid_body(e)))),
            };
        }
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }

    fn size_hint(&self) -> SizeHint {
        if self.eof {
            SizeHint::with_exact(0)
        } else {
            SizeHint::default()
        }
    }
}

/// Connection-side half of the request body: answers the handler's pulls
/// and drains whatever the handler left unread.
pub struct ReqBodySender<'conn, S>
where
    S: Stream + Unpin,
{
    payload_stream: &'conn mut S,
    receiver: mpsc::Receiver<oneshot::Sender<PayloadItem>>,
    eof: bool,
    detached: bool,
}

impl<'conn, S> ReqBodySender<'conn, S>
where
    S: Stream<Item = Result<Message<RequestHeader>, ParseError>> + Unpin,
{
    /// The sender has nothing further to forward: either the body reached
    /// end-of-stream, or the handler dropped its half.
    pub fn is_finished(&self) -> bool {
        self.eof || self.detached
    }

    /// Services one pull from the handler: waits for a pull request, decodes
    /// one payload item from the stream and forwards it.
    ///
    /// Must not be called after [`is_finished`](Self::is_finished) returns
    /// true, or the sender would read past the body into the next request.
    pub async fn forward_once(&mut self) -> Result<(), ParseError> {
        let reply = match self.receiver.next().await {
            Some(reply) => reply,
            None => {
                // handler dropped the body without reading it to the end;
                // the leftover is drained later by skip_body
                self.detached = true;
                return Ok(());
            }
        };

        match self.payload_stream.next().await {
            Some(Ok(Message::Payload(payload_item))) => {
                if payload_item.is_eof() {
                    self.eof = true;
                }
                let _ = reply.send(payload_item);
                Ok(())
            }

            Some(Ok(Message::Header(_))) => {
                Err(ParseError::invalid_body("received header while reading body"))
            }

            Some(Err(e)) => Err(e),

            None => Err(ParseError::UnexpectedEof),
        }
    }

    /// Drains the request body to end-of-stream so the receive buffer is
    /// aligned on the start of the next request.
    pub async fn skip_body(&mut self) -> Result<(), ParseError> {
        if self.eof {
            return Ok(());
        }

        let mut size: usize = 0;
        loop {
            match self.payload_stream.next().await {
                Some(Ok(Message::Payload(payload_item))) => match payload_item {
                    PayloadItem::Chunk(bytes) => size += bytes.len(),
                    PayloadItem::Eof => {
                        self.eof = true;
                        if size > 0 {
                            info!(size, "skipped unread request body");
                        }
                        return Ok(());
                    }
                },

                Some(Ok(Message::Header(_))) => {
                    return Err(ParseError::invalid_body("received header while skipping body"))
                }

                Some(Err(e)) => return Err(e),

                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }
}
