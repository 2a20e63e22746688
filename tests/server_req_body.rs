use std::net::SocketAddr;
use std::sync::Arc;

use http::{header, Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};

use nano_http::handler::make_handler;
use nano_http::protocol::body::{ReqBody, ResponseBody};
use nano_http::protocol::HttpError;

mod common;

/// `/echo` sends the body back with the request's framing; `/discard`
/// answers without reading the body at all.
async fn route(req: Request<ReqBody>) -> Result<Response<ResponseBody>, HttpError> {
    let path = req.uri().path().to_owned();

    if path == "/echo" && req.method() == Method::POST {
        let chunked = req.headers().contains_key(header::TRANSFER_ENCODING);

        let bytes = req.into_body().collect().await?.to_bytes();

        let body = if chunked {
            let frames = futures::stream::iter(vec![Ok::<_, HttpError>(Frame::data(bytes))]);
            ResponseBody::stream(StreamBody::new(frames))
        } else {
            ResponseBody::once(bytes)
        };

        return Ok(Response::new(body));
    }

    if path == "/discard" {
        return Ok(Response::new(ResponseBody::once("ok")));
    }

    Ok(Response::builder().status(StatusCode::NOT_FOUND).body(ResponseBody::empty()).unwrap())
}

async fn echo_server() -> SocketAddr {
    common::start_server(Arc::new(make_handler(route))).await
}

#[tokio::test]
async fn echo_content_length() {
    let addr = echo_server().await;

    let response = common::roundtrip(addr, b"POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello").await;

    assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello");
}

#[tokio::test]
async fn echo_chunked() {
    let addr = echo_server().await;

    let response = common::roundtrip(
        addr,
        b"POST /echo HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n6\r\nWorld!\r\n0\r\n\r\n",
    )
    .await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\nB\r\nHelloWorld!\r\n0\r\n\r\n"
    );
}

#[tokio::test]
async fn unread_body_is_drained_for_the_next_request() {
    let addr = echo_server().await;

    let response = common::roundtrip(
        addr,
        b"POST /discard HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello\
          POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nhi",
    )
    .await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok\
          HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nhi"
    );
}

#[tokio::test]
async fn body_on_get_is_rejected() {
    let addr = echo_server().await;

    let response = common::roundtrip(addr, b"GET / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello").await;

    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{text}");
    assert!(text.contains("HTTP body not allowed"), "{text}");
}

#[tokio::test]
async fn bad_content_length_is_rejected() {
    let addr = echo_server().await;

    let response = common::roundtrip(addr, b"POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: banana\r\n\r\n").await;

    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{text}");
    assert!(text.contains("bad Content-Length"), "{text}");
}

#[tokio::test]
async fn oversized_header_block_is_rejected() {
    let addr = echo_server().await;

    // exactly the cap, with no terminating blank line in sight
    let mut raw = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
    raw.resize(8192, b'a');

    let response = common::roundtrip(addr, &raw).await;

    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 413 "), "{text}");
}

#[tokio::test]
async fn eof_mid_header_is_rejected() {
    let addr = echo_server().await;

    let response = common::roundtrip(addr, b"GET / HTT").await;

    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{text}");
    assert!(text.contains("unexpected EOF"), "{text}");
}

#[tokio::test]
async fn eof_mid_chunked_body_kills_the_connection() {
    let addr = echo_server().await;

    let response =
        common::roundtrip(addr, b"POST /echo HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHel").await;

    // the body broke mid-flight: no usable response can be framed
    assert!(response.is_empty(), "{:?}", String::from_utf8_lossy(&response));
}
