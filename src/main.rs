use std::path::Path;
use std::sync::Arc;

use http::{header, Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use nano_http::file::serve_file;
use nano_http::handler::make_handler;
use nano_http::protocol::body::{ReqBody, ResponseBody};
use nano_http::protocol::HttpError;
use nano_http::server::Server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let handler = make_handler(route);
    Server::new("127.0.0.1:1234").run(Arc::new(handler)).await
}

async fn route(req: Request<ReqBody>) -> Result<Response<ResponseBody>, HttpError> {
    let path = req.uri().path().to_owned();

    if path == "/" && (req.method() == Method::GET || req.method() == Method::HEAD) {
        return Ok(Response::new(ResponseBody::once("hello world.\n")));
    }

    if path == "/echo" && req.method() == Method::POST {
        return echo(req).await;
    }

    if let Some(rest) = path.strip_prefix("/files/") {
        return files(req, rest).await;
    }

    Ok(Response::builder().status(StatusCode::NOT_FOUND).body(ResponseBody::once("404 Not Found\n")).unwrap())
}

/// Echoes the request body back, keeping the request's framing: a
/// `Content-Length` body comes back with a known length, a chunked body
/// comes back chunked.
async fn echo(req: Request<ReqBody>) -> Result<Response<ResponseBody>, HttpError> {
    let chunked = req.headers().contains_key(header::TRANSFER_ENCODING);

    let bytes = req.into_body().collect().await?.to_bytes();

    let body = if chunked {
        let frames = futures::stream::iter(vec![Ok::<_, HttpError>(Frame::data(bytes))]);
        ResponseBody::stream(StreamBody::new(frames))
    } else {
        ResponseBody::once(bytes)
    };

    Ok(Response::new(body))
}

async fn files(req: Request<ReqBody>, rest: &str) -> Result<Response<ResponseBody>, HttpError> {
    // path policy is the handler's concern: refuse traversal outright
    if rest.split('/').any(|segment| segment == "..") {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(ResponseBody::once("400 Bad Request\n"))
            .unwrap());
    }

    Ok(serve_file(req.headers(), Path::new("public").join(rest)).await)
}
