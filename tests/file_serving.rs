use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use http::{Request, Response};

use nano_http::file::serve_file;
use nano_http::handler::make_handler;
use nano_http::protocol::body::{ReqBody, ResponseBody};
use nano_http::protocol::HttpError;

mod common;

/// Ten known bytes so range windows are easy to assert.
const CONTENT: &[u8] = b"0123456789";

async fn file_server() -> (tempfile::TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.bin"), CONTENT).unwrap();
    std::fs::create_dir(dir.path().join("subdir")).unwrap();

    let root: PathBuf = dir.path().to_path_buf();
    let handler = make_handler(move |req: Request<ReqBody>| {
        let root = root.clone();
        async move {
            let rest = req.uri().path().strip_prefix("/files/").unwrap_or("").to_owned();
            Ok::<Response<ResponseBody>, HttpError>(serve_file(req.headers(), root.join(rest)).await)
        }
    });

    let addr = common::start_server(Arc::new(handler)).await;
    (dir, addr)
}

#[tokio::test]
async fn whole_file_200() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/a.bin HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\n0123456789");
}

#[tokio::test]
async fn range_206() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/a.bin HTTP/1.1\r\nHost: x\r\nRange: bytes=0-3\r\n\r\n").await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 206 Partial Content\r\ncontent-range: bytes 0-3/10\r\ncontent-length: 3\r\n\r\n012"
    );
}

#[tokio::test]
async fn open_ended_range_runs_to_the_end() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/a.bin HTTP/1.1\r\nHost: x\r\nRange: bytes=4-\r\n\r\n").await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 206 Partial Content\r\ncontent-range: bytes 4-10/10\r\ncontent-length: 6\r\n\r\n456789"
    );
}

#[tokio::test]
async fn range_past_the_end_416() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/a.bin HTTP/1.1\r\nHost: x\r\nRange: bytes=100-\r\n\r\n").await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 416 Range Not Satisfiable\r\ncontent-range: bytes */10\r\ncontent-length: 0\r\n\r\n"
    );
}

#[tokio::test]
async fn unparseable_range_416() {
    let (_dir, addr) = file_server().await;

    let response =
        common::roundtrip(addr, b"GET /files/a.bin HTTP/1.1\r\nHost: x\r\nRange: bytes=0-3,5-6\r\n\r\n").await;

    assert_eq!(
        &response[..],
        b"HTTP/1.1 416 Range Not Satisfiable\r\ncontent-range: bytes */10\r\ncontent-length: 0\r\n\r\n"
    );
}

#[tokio::test]
async fn missing_file_404() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/nope.bin HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(&response[..], b"HTTP/1.1 404 Not Found\r\ncontent-length: 14\r\n\r\n404 Not Found\n");
}

#[tokio::test]
async fn directory_404() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"GET /files/subdir HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(&response[..], b"HTTP/1.1 404 Not Found\r\ncontent-length: 14\r\n\r\n404 Not Found\n");
}

#[tokio::test]
async fn head_file_has_headers_only() {
    let (_dir, addr) = file_server().await;

    let response = common::roundtrip(addr, b"HEAD /files/a.bin HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\n");
}
