//! Upload error type
//!
//! Every way an upload can fail, with the status code and the short
//! plain-text message the client gets to see.

use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http::{self, ResponseBody};
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum UploadError {
    /// No `file` field, or one without a file name
    #[error("Error retrieving the file")]
    MissingFile,

    #[error("Invalid multipart request: {0}")]
    InvalidMultipart(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Remote host resolves to a loopback, private or link-local address
    #[error("Refusing to fetch from private address {0}")]
    PrivateAddress(std::net::IpAddr),

    /// Content type outside the allowed image/video prefixes
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large (max: {limit} bytes)")]
    TooLarge { limit: u64 },

    #[error("Remote server answered with status {0}")]
    RemoteStatus(u16),

    #[error("Failed to fetch remote file: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Error reading request body: {0}")]
    Body(String),

    #[error("Error storing the file: {0}")]
    Storage(#[from] StoreError),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile
            | Self::InvalidMultipart(_)
            | Self::InvalidJson(_)
            | Self::InvalidUrl(_)
            | Self::PrivateAddress(_)
            | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RemoteStatus(_) | Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message for the response body; server-side details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(_) => "Error storing the file".to_string(),
            Self::Remote(_) => "Error fetching the remote file".to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status();
        if status.is_server_error() {
            crate::logger::log_error(&self.to_string());
        } else {
            crate::logger::log_warning(&format!("Upload rejected: {self}"));
        }
        http::build_error_response(status, &self.public_message())
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(StoreError::Io(e))
    }
}

impl From<multer::Error> for UploadError {
    fn from(e: multer::Error) -> Self {
        match e {
            multer::Error::StreamSizeExceeded { limit }
            | multer::Error::FieldSizeExceeded { limit, .. } => Self::TooLarge { limit },
            other => Self::InvalidMultipart(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(UploadError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::UnsupportedType("text/plain".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            UploadError::TooLarge { limit: 5 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(UploadError::RemoteStatus(404).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            UploadError::from(std::io::Error::other("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = UploadError::from(std::io::Error::other("/srv/uploads: disk full"));
        assert_eq!(err.public_message(), "Error storing the file");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_multer_size_errors_map_to_too_large() {
        let err = UploadError::from(multer::Error::StreamSizeExceeded { limit: 10 });
        assert!(matches!(err, UploadError::TooLarge { limit: 10 }));
    }
}
