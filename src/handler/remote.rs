//! Remote URL upload handler (`POST /url`)
//!
//! Fetches the URL named in a small JSON body and runs the response through
//! the same ingest pipeline as a multipart upload. The download is capped at
//! `upload.max_remote_size`, both by the declared length and while streaming.
//! Unless `upload.allow_private_hosts` is set, hosts that resolve to
//! loopback, private or link-local addresses are refused.

use std::error::Error;
use std::net::IpAddr;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use reqwest::redirect::{Action, Attempt, Policy};
use reqwest::Url;
use serde::Deserialize;

use crate::config::AppState;
use crate::error::UploadError;
use crate::handler::ingest::{self, StoredFile, UploadMeta};

/// Upper bound for the JSON request body
pub const MAX_JSON_BODY: usize = 16 * 1024;

/// Redirects followed before a fetch is given up
pub const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Deserialize)]
struct UrlRequest {
    url: String,
}

pub async fn handle_url<B>(req: Request<B>, state: &AppState) -> Result<StoredFile, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_JSON_BODY)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                UploadError::TooLarge {
                    limit: MAX_JSON_BODY as u64,
                }
            } else {
                UploadError::Body(e.to_string())
            }
        })?
        .to_bytes();

    let request: UrlRequest =
        serde_json::from_slice(&body).map_err(|e| UploadError::InvalidJson(e.to_string()))?;
    let url = parse_remote_url(&request.url)?;

    let policy = &state.config.upload;
    if !policy.allow_private_hosts {
        check_public_host(&url).await?;
    }
    let response = state.client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(UploadError::RemoteStatus(status.as_u16()));
    }
    if response
        .content_length()
        .is_some_and(|len| len > policy.max_remote_size)
    {
        return Err(UploadError::TooLarge {
            limit: policy.max_remote_size,
        });
    }

    let declared_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let original_name = remote_file_name(&url);

    tracing::debug!(%url, content_type = ?declared_type, "fetching remote file");
    let meta = UploadMeta {
        original_name: &original_name,
        declared_type: declared_type.as_deref(),
        limit: policy.max_remote_size,
    };
    ingest::ingest(&state.store, policy, meta, response.bytes_stream()).await
}

/// Parse and accept only absolute `http`/`https` URLs
fn parse_remote_url(raw: &str) -> Result<Url, UploadError> {
    let url = Url::parse(raw.trim()).map_err(|e| UploadError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(UploadError::InvalidUrl("missing host".to_string())),
        other => Err(UploadError::InvalidUrl(format!("unsupported scheme '{other}'"))),
    }
}

/// Resolve the URL's host and refuse it if any address is not public
async fn check_public_host(url: &Url) -> Result<(), UploadError> {
    let host = url.host_str().unwrap_or_default();
    let addrs: Vec<IpAddr> = match literal_ip(host) {
        Some(ip) => vec![ip],
        None => {
            let port = url.port_or_known_default().unwrap_or(80);
            tokio::net::lookup_host((host, port))
                .await
                .map_err(|e| UploadError::InvalidUrl(format!("cannot resolve '{host}': {e}")))?
                .map(|addr| addr.ip())
                .collect()
        }
    };
    match addrs.into_iter().find(|ip| is_private_ip(*ip)) {
        Some(ip) => Err(UploadError::PrivateAddress(ip)),
        None => Ok(()),
    }
}

/// `host_str` of an IP literal, brackets and all, as an address
fn literal_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[').trim_end_matches(']').parse().ok()
}

/// Loopback, private, link-local, shared, documentation or unspecified
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || (a == 100 && (b & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xFE00) == 0xFC00
                || (first & 0xFFC0) == 0xFE80
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}

/// Redirect policy for the fetch client.
///
/// Follows up to [`MAX_REDIRECTS`] hops. Without `allow_private_hosts`, a
/// redirect to a private IP literal or `localhost` is refused.
pub fn redirect_policy(allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt: Attempt<'_>| -> Action {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let host = attempt.url().host_str().unwrap_or_default();
        let private = host.eq_ignore_ascii_case("localhost")
            || literal_ip(host).is_some_and(is_private_ip);
        if private && !allow_private_hosts {
            return attempt.error("redirect to a private address");
        }
        attempt.follow()
    })
}

/// Last non-empty path segment, used for the extension
fn remote_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::{spawn_origin, stored_files, test_config, test_state, JPEG, PNG};
    use http_body_util::Full;

    fn url_request(body: impl Into<Bytes>) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/url")
            .header("content-type", "application/json")
            .body(Full::new(body.into()))
            .unwrap()
    }

    fn json_for(url: &str) -> String {
        serde_json::json!({ "url": url }).to_string()
    }

    #[test]
    fn test_parse_remote_url() {
        assert!(parse_remote_url("https://example.com/a.png").is_ok());
        assert!(parse_remote_url(" http://example.com/a.png ").is_ok());
        assert!(matches!(
            parse_remote_url("ftp://example.com/a.png"),
            Err(UploadError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_remote_url("file:///etc/passwd"),
            Err(UploadError::InvalidUrl(_))
        ));
        assert!(matches!(parse_remote_url("not a url"), Err(UploadError::InvalidUrl(_))));
    }

    #[test]
    fn test_remote_file_name() {
        let url = Url::parse("https://example.com/pics/cat.JPG?size=large").unwrap();
        assert_eq!(remote_file_name(&url), "cat.JPG");
        let url = Url::parse("https://example.com/pics/").unwrap();
        assert_eq!(remote_file_name(&url), "pics");
        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(remote_file_name(&url), "");
    }

    #[test]
    fn test_private_addresses() {
        for ip in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "192.168.1.1",
            "169.254.169.254",
            "100.64.0.1",
            "0.0.0.0",
            "::1",
            "fd00::1",
            "fe80::1",
            "::ffff:127.0.0.1",
        ] {
            assert!(is_private_ip(ip.parse().unwrap()), "{ip}");
        }
        for ip in ["93.184.216.34", "1.1.1.1", "2606:4700:4700::1111"] {
            assert!(!is_private_ip(ip.parse().unwrap()), "{ip}");
        }
        assert_eq!(literal_ip("[::1]"), Some("::1".parse().unwrap()));
        assert_eq!(literal_ip("example.com"), None);
    }

    #[tokio::test]
    async fn test_private_host_refused_unless_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.upload.allow_private_hosts = false;
        let state = test_state(config);
        let origin = spawn_origin(200, JPEG, true).await;

        let req = url_request(json_for(&format!("http://{origin}/cat.jpg")));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::PrivateAddress(_)));
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);

        let req = url_request(json_for("http://localhost:1/cat.jpg"));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::PrivateAddress(_)));
        assert!(stored_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_fetches_and_stores_remote_image() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(test_config(tmp.path()));
        let origin = spawn_origin(200, JPEG, true).await;

        let req = url_request(json_for(&format!("http://{origin}/cat.JPG")));
        let stored = handle_url(req, &state).await.unwrap();

        assert!(stored.name.ends_with(".jpg"));
        assert_eq!(stored.content_type, "image/jpeg");
        assert_eq!(std::fs::read(tmp.path().join(&stored.name)).unwrap(), JPEG);
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(test_config(tmp.path()));
        let origin = spawn_origin(404, b"gone", true).await;

        let req = url_request(json_for(&format!("http://{origin}/a.png")));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::RemoteStatus(404)));
        assert!(stored_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_declared_length_over_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.upload.max_remote_size = 16;
        let state = test_state(config);
        let origin = spawn_origin(200, PNG, true).await;

        let req = url_request(json_for(&format!("http://{origin}/a.png")));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: 16 }));
        assert!(stored_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_undeclared_length_is_cut_at_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.upload.max_remote_size = 16;
        let state = test_state(config);
        let origin = spawn_origin(200, PNG, false).await;

        let req = url_request(json_for(&format!("http://{origin}/a.png")));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: 16 }));
        assert!(stored_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_remote_non_media_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(test_config(tmp.path()));
        let origin = spawn_origin(200, b"<html>hello</html>", true).await;

        let req = url_request(json_for(&format!("http://{origin}/page.png")));
        let err = handle_url(req, &state).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
        assert!(stored_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_bad_json_and_oversized_body() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(test_config(tmp.path()));

        let err = handle_url(url_request("{\"link\": 1}"), &state).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidJson(_)));

        let err = handle_url(url_request("not json"), &state).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidJson(_)));

        let huge = vec![b' '; MAX_JSON_BODY + 1];
        let err = handle_url(url_request(huge), &state).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }
}
