//! Cover art loading.

use bytes::Bytes;

use crate::error::Result;

/// Decoded-enough artwork: dimensions are known and the encoded bytes are
/// ready for the host to hand to its notification API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub reference: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub data: Bytes,
}

/// Fetches artwork by reference (URL or `file://` path).
///
/// Called from a worker task, never from the command context.
#[async_trait::async_trait]
pub trait ArtworkFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Artwork>;
}
