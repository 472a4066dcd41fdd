//! Random file name generation
//!
//! Stored files are named `<random>.<ext>`: a fixed-length alphanumeric
//! stem followed by the lower-cased extension of the uploaded file.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::http::{mime, sniff};

/// Extensions longer than this are treated as absent
const MAX_EXTENSION_LEN: usize = 16;

/// Extension used when neither the file name nor its content tells us one
pub const FALLBACK_EXTENSION: &str = "bin";

/// Generate `length` random characters from `[A-Za-z0-9]`
pub fn random_stem(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Extract the lower-cased extension of a client supplied file name.
///
/// Only the final path component is considered, so `a.b/c` has no
/// extension. Empty, overlong or non-alphanumeric extensions yield `None`.
pub fn extension_of(original: &str) -> Option<String> {
    let base = original.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(original);
    let (_, ext) = base.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Pick the extension for a stored file.
///
/// The client's extension wins as long as the type it maps to is one of
/// `allowed_types`; otherwise the sniffed extension is used, then
/// [`FALLBACK_EXTENSION`].
pub fn choose_extension(
    original: &str,
    sniffed: Option<&str>,
    allowed_types: &[String],
) -> String {
    extension_of(original)
        .filter(|ext| sniff::is_allowed(mime::get_content_type(Some(ext)), allowed_types))
        .or_else(|| sniffed.map(str::to_ascii_lowercase))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Random name with the given extension, e.g. `aZ3kQ9.png`
pub fn random_name(length: usize, extension: &str) -> String {
    format!("{}.{extension}", random_stem(length))
}
