//! Storage module
//!
//! The upload directory is the only state the service keeps: no index, no
//! metadata, just `<random>.<ext>` files.

pub mod names;
mod store;

pub use store::{resolve_in, PendingFile, StoreError, UploadStore};
