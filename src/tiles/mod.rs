pub mod cache;
pub mod client;
pub mod fetcher;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
#[cfg(feature = "http")]
pub use client::HttpTileClient;
pub use client::TileClient;
pub use fetcher::{CropWindow, RasterBuffer, RasterFetcher, RasterMeta, TileRange};
pub use source::{TileSource, UrlTemplate};
