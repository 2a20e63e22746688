use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;

use futures::{SinkExt, StreamExt};
use http::{Method, Response, StatusCode, Version};
use http_body::Body;
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::body::{ReqBody, ResponseBody};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RequestHeader, ResponseHead, SendError};

/// The per-connection engine.
///
/// Runs the request loop over one accepted socket: decode a request head,
/// hand the streaming body to the handler, write the response, drain
/// whatever body the handler left unread, repeat. The receive buffer lives
/// inside `framed_read` and survives across requests, so bytes a client
/// sent ahead for the next request are never lost or re-ordered.
///
/// Backpressure is poll-driven: the socket is only read when this task
/// awaits the framed stream, which happens exactly when the engine or the
/// handler asks for bytes.
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header(header))) => {
                    if !self.do_process(header, &handler).await? {
                        info!("request version asks for close, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    let e = ParseError::invalid_body("received body while expecting a request head");
                    error!("{e}");
                    self.send_error_response(StatusCode::BAD_REQUEST, e.to_string()).await;
                    return Err(e.into());
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {e}");
                    if let Some(status) = e.status() {
                        self.send_error_response(status, e.to_string()).await;
                    }
                    return Err(e.into());
                }

                None => {
                    info!("no more requests, connection shutdown");
                    return Ok(());
                }
            }
        }
    }

    /// Serves one request; returns whether the connection may be reused.
    async fn do_process<H>(&mut self, header: RequestHeader, handler: &Arc<H>) -> Result<bool, HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let is_head = header.method() == Method::HEAD;
        let keep_alive = header.version() != Version::HTTP_10;

        let (req_body, mut body_sender) = ReqBody::body_channel(&mut self.framed_read);

        let request = header.body(req_body);

        // run the handler and the body forwarding concurrently: the handler
        // may await body bytes that only the connection task can decode, so
        // neither side can simply run to completion first
        let response_result = {
            tokio::pin! {
                let handle_future = handler.call(request);
            }

            loop {
                select! {
                    biased;
                    response = &mut handle_future => break response,
                    result = body_sender.forward_once(), if !body_sender.is_finished() => {
                        if let Err(e) = result {
                            // the body is broken on the wire: no response can
                            // be framed on top of it
                            return Err(e.into());
                        }
                    }
                }
            }
        };

        send_response(&mut self.framed_write, response_result, is_head).await?;

        if !keep_alive {
            return Ok(false);
        }

        // align the receive buffer on the next request
        body_sender.skip_body().await?;

        Ok(true)
    }

    async fn send_error_response(&mut self, status: StatusCode, message: String) {
        // best effort: the connection is going down with the original error
        // regardless of whether the peer still reads this
        let response = build_error_response(status, message);
        let _ = do_send_response(&mut self.framed_write, response, false).await;
    }
}

async fn send_response<W, T, E>(
    framed_write: &mut FramedWrite<W, ResponseEncoder>,
    response_result: Result<Response<T>, E>,
    is_head: bool,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
    T: Body<Data = Bytes> + Unpin,
    T::Error: Display,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    match response_result {
        Ok(response) => do_send_response(framed_write, response, is_head).await,
        Err(e) => {
            error!("handler failed, cause: {}", e.into());
            let error_response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR, String::new());
            do_send_response(framed_write, error_response, is_head).await
        }
    }
}

async fn do_send_response<W, T>(
    framed_write: &mut FramedWrite<W, ResponseEncoder>,
    response: Response<T>,
    is_head: bool,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
    T: Body<Data = Bytes> + Unpin,
    T::Error: Display,
{
    let (header_parts, mut body) = response.into_parts();

    let payload_size = {
        let size_hint = body.size_hint();
        match size_hint.exact() {
            Some(0) => PayloadSize::Empty,
            Some(length) => PayloadSize::Length(length),
            None => PayloadSize::Chunked,
        }
    };

    framed_write.feed(Message::Header((ResponseHead::from_parts(header_parts, ()), payload_size))).await?;

    if is_head {
        // a HEAD response keeps the framing headers of the matching GET but
        // carries no body bytes, not even the chunked terminator
        framed_write.encoder_mut().skip_payload();
    } else {
        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    let payload_item = frame
                        .into_data()
                        .map(PayloadItem::Chunk)
                        .map_err(|_frame| SendError::invalid_body("unexpected non-data frame in response body"))?;

                    framed_write.feed(Message::Payload(payload_item)).await?;
                }
                Some(Err(e)) => {
                    return Err(SendError::invalid_body(format!("response body failed: {e}")).into());
                }
                None => {
                    framed_write.feed(Message::Payload(PayloadItem::Eof)).await?;
                    break;
                }
            }
        }
    }

    framed_write.flush().await?;
    Ok(())
}

fn build_error_response(status_code: StatusCode, message: String) -> Response<ResponseBody> {
    Response::builder()
        .status(status_code)
        .body(ResponseBody::from(message))
        .unwrap()
}
