//! Shared fixtures for handler tests

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use futures_util::stream;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::http::ResponseBody;

pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
];

pub const JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
    0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

pub const BOUNDARY: &str = "----picdropTestBoundary7MA4YWxk";

/// Defaults with the upload directory pointed at `upload_dir`
pub fn test_config(upload_dir: &Path) -> Config {
    let mut config = Config::load_from("/nonexistent/picdrop-test-config").unwrap();
    config.storage.upload_dir = upload_dir.to_string_lossy().into_owned();
    config.storage.static_dir = upload_dir.join("static").to_string_lossy().into_owned();
    config.logging.access_log = false;
    config.upload.max_file_size = 64 * 1024;
    config.upload.max_request_size = 128 * 1024;
    config.upload.max_remote_size = 64 * 1024;
    config.upload.fetch_timeout = 5;
    config.upload.allow_private_hosts = true;
    config
}

pub fn test_state(config: Config) -> Arc<AppState> {
    AppState::shared(config).unwrap()
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

/// One multipart part: (field name, optional file name, content type, data)
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match filename {
            Some(f) => format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n"),
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Full<Bytes>> {
    let body = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

pub fn get_request(path: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub async fn body_bytes(response: Response<ResponseBody>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub fn location(response: &Response<ResponseBody>) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

pub fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Serve `body` with `status` on an ephemeral local port.
///
/// With `declare_length` unset the body goes out chunked, so the client
/// cannot know the size up front.
pub async fn spawn_origin(status: u16, body: &'static [u8], declare_length: bool) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(move |_req: Request<hyper::body::Incoming>| async move {
                    let frames = stream::iter(vec![Ok::<_, Infallible>(Frame::data(
                        Bytes::from_static(body),
                    ))]);
                    let mut builder = Response::builder().status(status);
                    if declare_length {
                        builder = builder.header("content-length", body.len());
                    }
                    Ok::<_, Infallible>(builder.body(StreamBody::new(frames)).unwrap())
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(socket), service)
                    .await;
            });
        }
    });

    addr
}
