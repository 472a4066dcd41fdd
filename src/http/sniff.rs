//! Content sniffing
//!
//! Classifies an upload from its leading bytes instead of trusting the
//! client. Only the first [`SNIFF_LEN`] bytes are ever inspected.

use crate::config::UploadConfig;
use crate::http::mime;
use crate::storage::names;

/// Number of leading bytes used for classification
pub const SNIFF_LEN: usize = 512;

/// Outcome of classifying an upload that passed the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub content_type: String,
    /// Extension implied by the content, if it was recognised
    pub extension: Option<&'static str>,
}

/// Detect the media type of `head` from magic bytes
pub fn sniff(head: &[u8]) -> Option<infer::Type> {
    infer::get(&head[..head.len().min(SNIFF_LEN)])
}

/// Whether `content_type` starts with one of the allowed prefixes
pub fn is_allowed(content_type: &str, allowed: &[String]) -> bool {
    allowed
        .iter()
        .any(|prefix| content_type.starts_with(prefix.as_str()))
}

/// Decide whether an upload may be stored.
///
/// With sniffing enabled the leading bytes decide. Otherwise the declared
/// type is used, falling back to the type implied by the file name. On
/// rejection the offending content type is returned.
pub fn classify(
    head: &[u8],
    declared: Option<&str>,
    original_name: &str,
    policy: &UploadConfig,
) -> Result<Classified, String> {
    let classified = if policy.sniff_content {
        match sniff(head) {
            Some(kind) => Classified {
                content_type: kind.mime_type().to_string(),
                extension: Some(kind.extension()),
            },
            None => Classified {
                content_type: mime::OCTET_STREAM.to_string(),
                extension: None,
            },
        }
    } else {
        let content_type = declared
            .map(essence)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                let ext = names::extension_of(original_name);
                mime::get_content_type(ext.as_deref()).to_string()
            });
        Classified {
            content_type,
            extension: None,
        }
    };

    if is_allowed(&classified.content_type, &policy.allowed_types) {
        Ok(classified)
    } else {
        Err(classified.content_type)
    }
}

/// `Image/PNG; charset=x` -> `image/png`
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
        b'R',
    ];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

    fn policy(sniff_content: bool) -> UploadConfig {
        UploadConfig {
            max_file_size: 1024,
            max_request_size: 2048,
            max_remote_size: 1024,
            sniff_content,
            allowed_types: vec!["image/".to_string(), "video/".to_string()],
            fetch_timeout: 5,
            allow_private_hosts: false,
        }
    }

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff(PNG).unwrap().mime_type(), "image/png");
        assert_eq!(sniff(JPEG).unwrap().extension(), "jpg");
        assert!(sniff(b"hello world").is_none());
        assert!(sniff(b"").is_none());
    }

    #[test]
    fn test_classify_accepts_sniffed_image() {
        let classified = classify(JPEG, Some("text/plain"), "photo.PNG", &policy(true)).unwrap();
        assert_eq!(classified.content_type, "image/jpeg");
        assert_eq!(classified.extension, Some("jpg"));
    }

    #[test]
    fn test_classify_rejects_text_even_if_declared_image() {
        let rejected = classify(b"just some plain text\n", Some("image/png"), "x.png", &policy(true));
        assert_eq!(rejected, Err(mime::OCTET_STREAM.to_string()));
    }

    #[test]
    fn test_classify_without_sniffing_trusts_declared_type() {
        let p = policy(false);
        assert!(classify(b"anything", Some("Video/MP4; codecs=avc1"), "clip", &p).is_ok());
        assert_eq!(
            classify(b"anything", Some("application/pdf"), "doc.png", &p),
            Err("application/pdf".to_string())
        );
        // No declared type: fall back to the file name
        assert!(classify(b"anything", None, "clip.webm", &p).is_ok());
        assert!(classify(b"anything", None, "notes.txt", &p).is_err());
    }

    #[test]
    fn test_is_allowed() {
        let allowed = vec!["image/".to_string()];
        assert!(is_allowed("image/gif", &allowed));
        assert!(!is_allowed("video/mp4", &allowed));
    }
}
