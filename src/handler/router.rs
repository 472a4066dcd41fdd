//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation, dispatching and access logging.

use std::convert::Infallible;
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::error::UploadError;
use crate::handler::ingest::StoredFile;
use crate::handler::{remote, serve, upload};
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// Request context encapsulating what the file handlers need
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Where a path leads, before the method is looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    Index,
    Health,
    Upload,
    Url,
    Static(&'a str),
    Stored(&'a str),
    NotFound,
}

impl Route<'_> {
    const fn allow(self) -> &'static str {
        match self {
            Self::Upload | Self::Url => "POST",
            _ => "GET, HEAD",
        }
    }

    fn accepts(self, method: &Method) -> bool {
        match self {
            Self::Upload | Self::Url => method == Method::POST,
            _ => method == Method::GET || method == Method::HEAD,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let logging = &state.config.logging;
    let mut entry = logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, peer.ip().to_string()));

    let mut response = route_request(req, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }
    if let Some(entry) = entry.as_mut() {
        entry.finish(&response);
        logger::log_access(entry, &logging.access_log_format);
    }
    Ok(response)
}

/// Match a request path against the configured prefixes
fn match_route<'p>(path: &'p str, state: &AppState) -> Route<'p> {
    let config = &state.config;
    if path == "/" {
        return Route::Index;
    }
    if config.health.enabled && path == config.health.path {
        return Route::Health;
    }
    match path {
        "/upload" => return Route::Upload,
        "/url" => return Route::Url,
        _ => {}
    }
    if let Some(name) = path.strip_prefix(config.storage.static_prefix.as_str()) {
        return Route::Static(name);
    }
    if let Some(name) = path.strip_prefix(config.storage.serve_path.as_str()) {
        return Route::Stored(name);
    }
    match path.strip_prefix('/') {
        Some(name) if !name.is_empty() && !name.contains('/') => Route::Stored(name),
        _ => Route::NotFound,
    }
}

async fn route_request<B>(req: Request<B>, state: &Arc<AppState>) -> Response<ResponseBody>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let route = match_route(&path, state);

    if route == Route::NotFound {
        return http::build_404_response();
    }
    if !route.accepts(req.method()) {
        logger::log_warning(&format!("Method not allowed: {} {path}", req.method()));
        return http::build_405_response(route.allow());
    }

    let ctx = RequestContext {
        path: &path,
        is_head: req.method() == Method::HEAD,
        if_none_match: req
            .headers()
            .get("if-none-match")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    };

    match route {
        Route::Index => http::build_html_response(INDEX_HTML, ctx.is_head),
        Route::Health => http::build_health_response(),
        Route::Upload => {
            let limit = state.config.upload.max_request_size;
            if let Some(resp) = check_body_size(&req, limit) {
                return resp;
            }
            finish_upload(upload::handle_upload(req, state).await, "form", state)
        }
        Route::Url => finish_upload(remote::handle_url(req, state).await, "url", state),
        Route::Static(name) => {
            serve::serve_static(&ctx, Path::new(&state.config.storage.static_dir), name).await
        }
        Route::Stored(name) => {
            serve::serve_upload(&ctx, &state.store, name, &state.config.upload.allowed_types).await
        }
        Route::NotFound => http::build_404_response(),
    }
}

/// Redirect to the stored file, or turn the failure into its response
fn finish_upload(
    result: Result<StoredFile, UploadError>,
    source: &str,
    state: &AppState,
) -> Response<ResponseBody> {
    match result {
        Ok(stored) => {
            logger::log_stored(&stored.name, stored.size, &stored.content_type, source);
            http::build_redirect_response(&state.config.serve_url(&stored.name))
        }
        Err(e) => e.into_response(),
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(max_body_size))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
