//! Cover art fetching using Reqwest

use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    artwork::{Artwork, ArtworkFetcher},
    error::{BridgeError, Result},
};
use bytes::Bytes;
use core_async::task::spawn_blocking;
use core_async::time::sleep;
use reqwest::Client;
use tracing::{debug, warn};

const LOCAL_SCHEME: &str = "file://";

/// Reqwest-based artwork fetcher.
///
/// - `http(s)://` references are downloaded, with one retry on 5xx/429
/// - `file://` references are read from disk
///
/// Bytes are decoded once to learn the dimensions, so anything that is not a
/// readable image fails here rather than in the notification.
pub struct HttpArtworkFetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpArtworkFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_attempts: 2,
            retry_delay: Duration::from_millis(250),
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < self.max_attempts {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()));
                    }
                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Err(BridgeError::OperationFailed(format!("HTTP {status}")));
                    }
                    warn!(status = status.as_u16(), attempt = attempt + 1, "Artwork request failed with retryable status");
                    last_error = Some(BridgeError::OperationFailed(format!("HTTP {status}")));
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "Artwork request failed");
                    last_error = Some(if e.is_timeout() {
                        BridgeError::OperationFailed("Request timed out".to_string())
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            attempt += 1;
            if attempt < self.max_attempts {
                sleep(self.retry_delay * attempt).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }

    async fn read_local(&self, path: &str) -> Result<Bytes> {
        let path = urlencoding::decode(path)
            .map_err(|e| BridgeError::OperationFailed(format!("invalid path: {e}")))?;
        let data = tokio::fs::read(path.as_ref()).await?;
        Ok(Bytes::from(data))
    }
}

/// Decode `data` far enough to learn its format and size.
fn describe(reference: &str, data: Bytes) -> Result<Artwork> {
    let format = image::guess_format(&data)
        .map_err(|e| BridgeError::OperationFailed(format!("unrecognised image: {e}")))?;
    let img = image::load_from_memory_with_format(&data, format)
        .map_err(|e| BridgeError::OperationFailed(format!("failed to decode image: {e}")))?;

    Ok(Artwork {
        reference: reference.to_string(),
        width: img.width(),
        height: img.height(),
        mime_type: format.to_mime_type().to_string(),
        data,
    })
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, reference: &str) -> Result<Artwork> {
        let data = match reference.strip_prefix(LOCAL_SCHEME) {
            Some(path) => self.read_local(path).await?,
            None => self.download(reference).await?,
        };
        debug!(bytes = data.len(), "Artwork bytes loaded");

        let owned = reference.to_string();
        spawn_blocking(move || describe(&owned, data))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("decode task failed: {e}")))?
    }
}
