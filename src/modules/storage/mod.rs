//! Storage module for incident photos and profile images
//!
//! Provides a MinIO/S3-compatible client for uploads, deletes and
//! public URL handling. Uses the rust-s3 crate for lightweight S3
//! operations.

mod media_client;

pub use media_client::{direct_view_url, StorageClient};
