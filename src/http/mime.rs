//! Extension to Content-Type mapping
//!
//! Stored files are served with the type their extension implies; nothing
//! is read from the file itself at serve time.

use std::path::Path;

/// Fallback for extensions we do not know
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content-Type for a lower-cased file extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg" | "jfif") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",

        // Video
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        Some("mpg" | "mpeg") => "video/mpeg",
        Some("flv") => "video/x-flv",

        // Index page assets
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("woff2") => "font/woff2",

        _ => OCTET_STREAM,
    }
}

/// Content-Type for a path, by its (case-insensitive) extension
pub fn for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    get_content_type(extension.as_deref())
}
