use std::io;
use std::io::ErrorKind;
use std::path::Path;

use http::{header, HeaderMap, Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, SeekFrom};
use tracing::warn;

use crate::file::body::{FileBody, RangeFileBody};
use crate::protocol::body::ResponseBody;

const NOT_FOUND_BODY: &str = "404 Not Found\n";

/// Builds the response for a static file request.
///
/// Anything that prevents serving the file (missing, unreadable, not a
/// regular file) is a plain `404`: the cause is logged, never exposed.
/// A `Range: bytes=<a>-<b>` header selects the end-exclusive byte window
/// `[a, b)` (`a` defaults to 0, `b` to the file size, and is clamped to
/// it); an unparseable or unsatisfiable range gets `416` with the
/// `bytes */<size>` form.
pub async fn serve_file(headers: &HeaderMap, path: impl AsRef<Path>) -> Response<ResponseBody> {
    let path = path.as_ref();

    let (file, size) = match open_regular(path).await {
        Ok(opened) => opened,
        Err(e) => {
            warn!(path = %path.display(), cause = %e, "can't serve file");
            return not_found();
        }
    };

    let range = match headers.get(header::RANGE) {
        None => {
            let body = FileBody::new(file, size);
            return Response::builder().status(StatusCode::OK).body(ResponseBody::stream(body)).unwrap();
        }
        Some(value) => value.to_str().ok().and_then(|value| parse_range(value, size)),
    };

    let (start, end) = match range {
        Some((start, end)) if start < size && start <= end => (start, end.min(size)),
        _ => {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{size}"))
                .body(ResponseBody::empty())
                .unwrap();
        }
    };

    let mut file = file;
    if let Err(e) = file.seek(SeekFrom::Start(start)).await {
        warn!(path = %path.display(), cause = %e, "can't seek to range start");
        return not_found();
    }

    let body = RangeFileBody::new(file, end - start);
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
        .body(ResponseBody::stream(body))
        .unwrap()
}

async fn open_regular(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path).await?;
    let metadata = file.metadata().await?;

    if !metadata.is_file() {
        return Err(io::Error::new(ErrorKind::InvalidInput, "not a regular file"));
    }

    Ok((file, metadata.len()))
}

fn not_found() -> Response<ResponseBody> {
    Response::builder().status(StatusCode::NOT_FOUND).body(ResponseBody::once(NOT_FOUND_BODY)).unwrap()
}

/// Parses `bytes=<a>-<b>` where either number may be missing; anything else
/// (other units, multiple ranges, non-digits) is a parse failure.
fn parse_range(value: &str, size: u64) -> Option<(u64, u64)> {
    let range = value.strip_prefix("bytes=")?;
    let (start, end) = range.split_once('-')?;

    let start = if start.is_empty() { 0 } else { start.parse().ok()? };
    let end = if end.is_empty() { size } else { end.parse().ok()? };

    Some((start, end))
}
