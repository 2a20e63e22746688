//! TCP listener and accept loop.

use std::fmt::Display;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;

/// Binds an address and serves every accepted connection with its own
/// [`HttpConnection`] on its own task.
pub struct Server<Addr: ToSocketAddrs> {
    addr: Addr,
}

impl<Addr: ToSocketAddrs> Server<Addr> {
    pub fn new(addr: Addr) -> Self {
        Self { addr }
    }

    pub async fn run<H>(&self, handler: Arc<H>) -> io::Result<()>
    where
        H: Handler + 'static,
        H::Error: Send,
        H::RespBody: Body<Data = Bytes> + Unpin + Send + 'static,
        <H::RespBody as Body>::Error: Display + Send,
    {
        let tcp_listener = match TcpListener::bind(&self.addr).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(e);
            }
        };

        if let Ok(local_addr) = tcp_listener.local_addr() {
            info!(addr = %local_addr, "start listening");
        }

        loop {
            let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = handler.clone();

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer);
                match connection.process(handler).await {
                    Ok(_) => {
                        info!("finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!("service has error, cause {e}, connection shutdown");
                    }
                }
            });
        }
    }
}
