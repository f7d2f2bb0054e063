//! Cover art loading for the notification.
//!
//! Fetches run off the command task and are bounded by a timeout. Every
//! failure collapses into [`ServiceError::ImageFetch`]; callers render
//! without art.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{Artwork, ArtworkFetcher};
use core_async::time::timeout;
use core_runtime::logging::redact_url;
use lru::LruCache;
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

/// Art that has been fetched, keyed by reference.
pub struct ArtCache {
    entries: LruCache<String, Artwork>,
}

impl ArtCache {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, reference: &str) -> Option<Artwork> {
        self.entries.get(reference).cloned()
    }

    pub fn insert(&mut self, artwork: Artwork) {
        self.entries.put(artwork.reference.clone(), artwork);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch `reference` with `fetcher`, giving up after `limit`.
pub async fn fetch_artwork(
    fetcher: Arc<dyn ArtworkFetcher>,
    reference: String,
    limit: Duration,
) -> Result<Artwork> {
    let target = redact_url(&reference);
    debug!(art_url = %target, "Fetching cover art");

    match timeout(limit, fetcher.fetch(&reference)).await {
        Ok(Ok(artwork)) => {
            debug!(
                art_url = %target,
                width = artwork.width,
                height = artwork.height,
                "Cover art loaded"
            );
            Ok(artwork)
        }
        Ok(Err(e)) => {
            warn!(art_url = %target, error = %e, "Cover art fetch failed");
            Err(ServiceError::ImageFetch(e.to_string()))
        }
        Err(_) => {
            warn!(art_url = %target, timeout_ms = limit.as_millis() as u64, "Cover art fetch timed out");
            Err(ServiceError::ImageFetch(format!(
                "timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::BridgeError;
    use bytes::Bytes;

    fn art(reference: &str) -> Artwork {
        Artwork {
            reference: reference.to_string(),
            width: 512,
            height: 512,
            mime_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"\xff\xd8\xff"),
        }
    }

    struct Fixed(bridge_traits::Result<Artwork>);

    #[async_trait]
    impl ArtworkFetcher for Fixed {
        async fn fetch(&self, _reference: &str) -> bridge_traits::Result<Artwork> {
            match &self.0 {
                Ok(artwork) => Ok(artwork.clone()),
                Err(e) => Err(BridgeError::OperationFailed(e.to_string())),
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl ArtworkFetcher for Stalled {
        async fn fetch(&self, _reference: &str) -> bridge_traits::Result<Artwork> {
            core_async::sleep(Duration::from_secs(60)).await;
            Err(BridgeError::NotAvailable("unreachable".to_string()))
        }
    }

    #[test]
    fn test_cache_evicts_least_recent() {
        let mut cache = ArtCache::new(2);
        cache.insert(art("a"));
        cache.insert(art("b"));
        assert!(cache.get("a").is_some());
        cache.insert(art("c"));

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_still_caches_one() {
        let mut cache = ArtCache::new(0);
        cache.insert(art("a"));
        assert_eq!(cache.len(), 1);
    }

    #[core_async::test]
    async fn test_fetch_success() {
        let fetched = fetch_artwork(
            Arc::new(Fixed(Ok(art("https://img/1.jpg")))),
            "https://img/1.jpg".to_string(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(fetched.width, 512);
    }

    #[core_async::test]
    async fn test_fetch_failure_is_image_fetch_error() {
        let err = fetch_artwork(
            Arc::new(Fixed(Err(BridgeError::OperationFailed("404".to_string())))),
            "https://img/missing.jpg".to_string(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::ImageFetch(_)));
    }

    #[core_async::test]
    async fn test_fetch_times_out() {
        let err = fetch_artwork(
            Arc::new(Stalled),
            "https://img/slow.jpg".to_string(),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::ImageFetch(msg) if msg.contains("timed out")));
    }
}
