//! HTTP response building module
//!
//! Builders for the handful of responses the service sends. Errors are plain
//! text; there are no structured error codes.

use hyper::{Response, StatusCode};

use super::{empty, full, ResponseBody};

/// Build a plain-text response with the given status
pub fn build_error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("X-Content-Type-Options", "nosniff")
        .body(full(format!("{message}\n")))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response listing the accepted methods
pub fn build_405_response(allow: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", allow)
        .body(full("405 Method Not Allowed\n"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            fallback(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response(limit: u64) -> Response<ResponseBody> {
    build_error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &format!("413 Payload Too Large (limit: {limit} bytes)"),
    )
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache_control: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            fallback(StatusCode::NOT_MODIFIED)
        })
}

/// Build 303 See Other redirect, used after a successful upload
pub fn build_redirect_response(target: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header("Location", target)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(full(format!("{target}\n")))
        .unwrap_or_else(|e| {
            log_build_error("303", &e);
            fallback(StatusCode::SEE_OTHER)
        })
}

/// Build liveness response
pub fn build_health_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-store")
        .body(full("ok"))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            fallback(StatusCode::OK)
        })
}

/// Build generic HTML response
pub fn build_html_response(content: &'static str, is_head: bool) -> Response<ResponseBody> {
    let body = if is_head { empty() } else { full(content) };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content.len())
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            fallback(StatusCode::OK)
        })
}

/// Bare response carrying only a status, for when the builder itself fails
fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
