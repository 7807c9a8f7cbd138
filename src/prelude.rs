//! Prelude module for common quakeview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use quakeview::prelude::*;`

pub use crate::core::{
    config::{
        CameraConfig, GridConfig, LoaderConfig, MarkerConfig, SceneConfig, ScenePreset,
        TerrainConfig, TileSourceConfig, WallConfig,
    },
    geo::{GeoBounds, LonLat, MapPoint, MapSpace, TileCoord},
};

pub use crate::data::{DatasetQuery, Earthquake};

pub use crate::elevation::{
    decode_elevation_meters, sample_elevation_at, ElevationSampler, ElevationSource, FlatElevation,
};

pub use crate::mesh::{
    Color, InstanceBuffer, LineGeometry, LineTopology, MarkerInstance, MeshGeometry, Wall, WallSide,
};

pub use crate::scene::{
    HighlightPulse, PerspectiveCamera, SceneGeometry, SceneManager, TerrainState, Tooltip,
    ViewportRect,
};

pub use crate::runtime::{spawn, AsyncHandle};

#[cfg(feature = "http")]
pub use crate::tiles::HttpTileClient;
pub use crate::tiles::{RasterBuffer, RasterFetcher, RasterMeta, TileCache, TileClient, TileSource, UrlTemplate};

pub use crate::{Error as QuakeViewError, QuakeError, Result};

pub use std::sync::Arc;
