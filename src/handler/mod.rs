//! Request handler module
//!
//! Routing, the two upload paths (multipart form and remote URL) sharing one
//! ingest pipeline, and file serving.

pub mod ingest;
pub mod remote;
pub mod router;
pub mod serve;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main entry point
pub use router::handle_request;
