//! Multipart upload handler (`POST /upload`)

use std::error::Error;

use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use multer::{Constraints, Multipart, SizeLimit};

use crate::config::AppState;
use crate::error::UploadError;
use crate::handler::ingest::{self, StoredFile, UploadMeta};

/// Name of the form field carrying the file
pub const FILE_FIELD: &str = "file";

/// Store the `file` field of a `multipart/form-data` request.
///
/// Other fields are skipped. The whole body is capped at
/// `upload.max_request_size`, the file itself at `upload.max_file_size`.
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Result<StoredFile, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| UploadError::InvalidMultipart("missing Content-Type".to_string()))?;
    let boundary = multer::parse_boundary(content_type)?;

    let policy = &state.config.upload;
    let constraints = Constraints::new()
        .size_limit(SizeLimit::new().whole_stream(policy.max_request_size));
    let mut multipart = Multipart::with_constraints(
        http_body_util::BodyExt::into_data_stream(req.into_body()),
        boundary,
        constraints,
    );

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            while field.chunk().await?.is_some() {}
            continue;
        }

        let original_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or(UploadError::MissingFile)?
            .to_string();
        let declared_type = field.content_type().map(ToString::to_string);

        let meta = UploadMeta {
            original_name: &original_name,
            declared_type: declared_type.as_deref(),
            limit: policy.max_file_size,
        };
        return ingest::ingest(&state.store, policy, meta, field).await;
    }

    Err(UploadError::MissingFile)
}
