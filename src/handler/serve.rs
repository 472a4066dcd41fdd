//! File serving module
//!
//! Streams stored uploads and static assets from disk. The content type
//! comes from the extension only; for uploads it is further limited to the
//! accepted upload types, everything else goes out as an octet stream.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::{Response, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, sniff, ResponseBody};
use crate::logger;
use crate::storage::{self, UploadStore};

/// Sandbox applied to stored uploads so a scriptable image type cannot run
const UPLOAD_CSP: &str = "default-src 'none'; sandbox";

/// How a file is presented to the client
struct Presentation<'a> {
    cache_control: &'static str,
    /// Types served as-is; `None` allows every type
    allowed_types: Option<&'a [String]>,
}

/// Serve a stored upload by name
pub async fn serve_upload(
    ctx: &RequestContext<'_>,
    store: &UploadStore,
    name: &str,
    allowed_types: &[String],
) -> Response<ResponseBody> {
    let presentation = Presentation {
        cache_control: cache::IMMUTABLE,
        allowed_types: Some(allowed_types),
    };
    serve_file(ctx, store.resolve(name), presentation).await
}

/// Serve an asset from the static directory
pub async fn serve_static(
    ctx: &RequestContext<'_>,
    dir: &Path,
    name: &str,
) -> Response<ResponseBody> {
    let presentation = Presentation {
        cache_control: cache::REVALIDATE,
        allowed_types: None,
    };
    serve_file(ctx, storage::resolve_in(dir, name), presentation).await
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    path: Option<PathBuf>,
    presentation: Presentation<'_>,
) -> Response<ResponseBody> {
    let cache_control = presentation.cache_control;
    let Some(path) = path else {
        return http::build_404_response();
    };

    let file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = ctx.path, "requested file not found");
            return http::build_404_response();
        }
        Err(e) => {
            logger::log_error(&format!("Failed to open '{}': {e}", path.display()));
            return http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error reading the file");
        }
    };

    let metadata = match file.metadata().await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return http::build_404_response(),
        Err(e) => {
            logger::log_error(&format!("Failed to stat '{}': {e}", path.display()));
            return http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error reading the file");
        }
    };

    let etag = cache::etag_for(&metadata);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag, cache_control);
    }

    let content_type = match (mime::for_path(&path), presentation.allowed_types) {
        (ct, Some(allowed)) if !sniff::is_allowed(ct, allowed) => mime::OCTET_STREAM,
        (ct, _) => ct,
    };
    let body = if ctx.is_head {
        http::empty()
    } else {
        stream_body(file, path)
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", metadata.len())
        .header("ETag", &etag)
        .header("Cache-Control", cache_control)
        .header("X-Content-Type-Options", "nosniff");
    if presentation.allowed_types.is_some() {
        builder = builder.header("Content-Security-Policy", UPLOAD_CSP);
    }
    builder
        .body(body)
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build file response: {e}"));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error reading the file")
        })
}

/// Stream the file in chunks; a read error ends the body and is logged
fn stream_body(file: File, path: PathBuf) -> ResponseBody {
    let frames = ReaderStream::new(file)
        .inspect_err(move |e| {
            logger::log_error(&format!("Read failed while streaming '{}': {e}", path.display()));
        })
        .map_ok(Frame::data);
    StreamBody::new(frames).boxed_unsync()
}
