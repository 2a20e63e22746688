use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use nano_http::connection::HttpConnection;
use nano_http::handler::Handler;

/// Spawns an accept loop on an ephemeral port and serves every connection
/// with the given handler.
pub async fn start_server<H>(handler: Arc<H>) -> SocketAddr
where
    H: Handler + 'static,
    H::Error: Send,
    H::RespBody: Body<Data = Bytes> + Unpin + Send + 'static,
    <H::RespBody as Body>::Error: Display + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (tcp_stream, _remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => continue,
            };

            let handler = handler.clone();
            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let _ = HttpConnection::new(reader, writer).process(handler).await;
            });
        }
    });

    addr
}

/// Writes one raw request, half-closes the write side, and reads everything
/// the server sends back until it hangs up.
pub async fn roundtrip(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut tcp = TcpStream::connect(addr).await.unwrap();
    tcp.write_all(raw).await.unwrap();
    tcp.shutdown().await.unwrap();

    let mut response = Vec::new();
    tcp.read_to_end(&mut response).await.unwrap();
    response
}
