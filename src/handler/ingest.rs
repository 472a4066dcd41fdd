//! Upload ingest pipeline
//!
//! Shared by multipart and URL uploads: buffer the head, classify it, then
//! stream everything into a freshly named file. Nothing touches the upload
//! directory until the content has been accepted, and a failure after that
//! point removes the partial file again.

use futures_util::{Stream, StreamExt};
use hyper::body::Bytes;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::http::sniff::{self, SNIFF_LEN};
use crate::storage::{names, PendingFile, UploadStore};

/// A file that made it to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    /// Type the upload was accepted as
    pub content_type: String,
}

/// What the client told us about the upload
#[derive(Debug, Clone, Copy)]
pub struct UploadMeta<'a> {
    /// File name as sent by the client (multipart) or taken from the URL
    pub original_name: &'a str,
    /// Content-Type declared by the client or remote server
    pub declared_type: Option<&'a str>,
    /// Maximum number of bytes to accept
    pub limit: u64,
}

pub async fn ingest<S, E>(
    store: &UploadStore,
    policy: &UploadConfig,
    meta: UploadMeta<'_>,
    chunks: S,
) -> Result<StoredFile, UploadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<UploadError>,
{
    let mut chunks = std::pin::pin!(chunks);

    let mut head = Vec::with_capacity(SNIFF_LEN);
    while head.len() < SNIFF_LEN {
        let Some(chunk) = chunks.next().await else {
            break;
        };
        head.extend_from_slice(&chunk.map_err(Into::<UploadError>::into)?);
        check_limit(head.len() as u64, meta.limit)?;
    }

    let classified = sniff::classify(&head, meta.declared_type, meta.original_name, policy)
        .map_err(UploadError::UnsupportedType)?;
    let extension = names::choose_extension(
        meta.original_name,
        classified.extension,
        &policy.allowed_types,
    );

    let mut pending = store.create(&extension).await?;
    tracing::debug!(name = pending.name(), content_type = %classified.content_type, "writing upload");
    if let Err(e) = write_all(&mut pending, &head, &mut chunks, meta.limit).await {
        pending.discard().await;
        return Err(e);
    }

    let (name, size) = pending.commit();
    Ok(StoredFile {
        name,
        size,
        content_type: classified.content_type,
    })
}

async fn write_all<S, E>(
    pending: &mut PendingFile,
    head: &[u8],
    chunks: &mut S,
    limit: u64,
) -> Result<(), UploadError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<UploadError>,
{
    pending.write_chunk(head).await?;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(Into::<UploadError>::into)?;
        check_limit(pending.written() + chunk.len() as u64, limit)?;
        pending.write_chunk(&chunk).await?;
    }
    pending.flush().await?;
    Ok(())
}

const fn check_limit(size: u64, limit: u64) -> Result<(), UploadError> {
    if size > limit {
        Err(UploadError::TooLarge { limit })
    } else {
        Ok(())
    }
}
