//! HTTP protocol layer module
//!
//! Response builders, content type tables and content sniffing, kept apart
//! from the upload and serve logic.

pub mod cache;
pub mod mime;
pub mod response;
pub mod sniff;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;

pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_error_response, build_health_response, build_html_response, build_redirect_response,
};

/// Body type of every response: buffered or streamed from disk
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Buffered response body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty response body (HEAD, 304, redirects without text)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}
