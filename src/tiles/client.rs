use crate::Result;
use async_trait::async_trait;

/// Fetches the encoded bytes of one tile.
///
/// Any error (transport, non-success status, timeout) is treated by the
/// raster fetcher as a failed tile and replaced with the fallback fill.
#[async_trait]
pub trait TileClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(feature = "http")]
pub use http::HttpTileClient;

#[cfg(feature = "http")]
pub(crate) mod http {
    use super::*;
    use crate::QuakeError;
    use once_cell::sync::Lazy;
    use std::time::Duration;

    /// Shared async HTTP client. Public tile servers reject requests without
    /// a user agent, and building the client once keeps one connection pool.
    pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(concat!("quakeview/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(16)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    });

    /// Tile client backed by the shared reqwest client
    #[derive(Debug, Clone)]
    pub struct HttpTileClient {
        timeout: Duration,
    }

    impl HttpTileClient {
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }
    }

    impl Default for HttpTileClient {
        fn default() -> Self {
            Self::new(Duration::from_secs(10))
        }
    }

    #[async_trait]
    impl TileClient for HttpTileClient {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let response = HTTP_CLIENT.get(url).timeout(self.timeout).send().await?;

            if !response.status().is_success() {
                return Err(QuakeError::Tile(format!(
                    "HTTP {} for {}",
                    response.status(),
                    url
                )));
            }

            Ok(response.bytes().await?.to_vec())
        }
    }
}
