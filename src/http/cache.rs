//! HTTP cache control module
//!
//! Stored files never change after upload, so validators only need the size
//! and modification time.

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Cache-Control for stored files
pub const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Cache-Control for static assets, which may change between deploys
pub const REVALIDATE: &str = "public, max-age=3600";

/// Build a quoted `ETag` from file size and modification time
pub fn etag_for(metadata: &Metadata) -> String {
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("\"{:x}-{:x}\"", metadata.len(), mtime)
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma separated list, weak validators and `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e == etag || e.strip_prefix("W/") == Some(etag)
        })
    })
}
