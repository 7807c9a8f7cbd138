//! # quakeview
//!
//! Geodesy, tile stitching and procedural geometry for rendering earthquake
//! catalogues as a 3D box: draped satellite imagery over a Terrarium
//! elevation surface, depth walls, a reference grid and instanced markers.
//!
//! The library produces plain data (rasters, vertex and index buffers,
//! instance transforms). Drawing them is left to whatever renderer owns the
//! window.

pub mod core;
pub mod data;
pub mod elevation;
pub mod mesh;
pub mod prelude;
pub mod runtime;
pub mod scene;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{ScenePreset, SceneConfig},
    geo::{GeoBounds, LonLat, MapPoint, MapSpace, TileCoord},
};

pub use data::earthquake::Earthquake;

pub use elevation::{decode_elevation_meters, ElevationSampler, ElevationSource};

pub use mesh::{
    geometry::{LineGeometry, MeshGeometry},
    points::InstanceBuffer,
};

pub use scene::{
    camera::PerspectiveCamera,
    manager::{SceneManager, TerrainState},
};

pub use tiles::{
    fetcher::{RasterBuffer, RasterFetcher, RasterMeta},
    source::{TileSource, UrlTemplate},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, QuakeError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum QuakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Tile error: {0}")]
    Tile(String),

    #[error("Canvas unavailable: {0}")]
    Canvas(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = QuakeError;
