//! Configuration for the earthquake scene
//!
//! Every constant the geometry and tile pipeline consumes lives here so a
//! deployment can override it from JSON. Presets cover the common detail
//! trade-offs; `Custom` carries a fully specified configuration.

use crate::core::constants as con;
use crate::core::geo::GeoBounds;
use crate::mesh::color::Color;
use crate::tiles::source::UrlTemplate;
use crate::{QuakeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum ScenePreset {
    Balanced,
    LowDetail,
    HighDetail,
    Custom(SceneConfig),
}

impl ScenePreset {
    pub fn resolve(&self) -> SceneConfig {
        match self {
            Self::Balanced => SceneConfig::default(),
            Self::LowDetail => {
                let mut config = SceneConfig::default();
                config.imagery.zoom = 7;
                config.elevation.zoom = 4;
                config.terrain.segments = 50;
                config.walls.segments_along = 24;
                config.walls.segments_depth = 12;
                config.walls.edge_segments = 48;
                config
            }
            Self::HighDetail => {
                let mut config = SceneConfig::default();
                config.imagery.zoom = 9;
                config.elevation.zoom = 7;
                config.terrain.segments = 250;
                config.walls.segments_along = 96;
                config.walls.segments_depth = 48;
                config.walls.edge_segments = 192;
                config
            }
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ScenePreset {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub bounds: GeoBounds,
    pub earth_radius_km: f64,
    pub tile_size: u32,
    pub imagery: TileSourceConfig,
    pub elevation: TileSourceConfig,
    pub terrain: TerrainConfig,
    pub walls: WallConfig,
    pub grid: GridConfig,
    pub markers: MarkerConfig,
    pub camera: CameraConfig,
    pub loader: LoaderConfig,
    /// Depth range floor in kilometres
    pub min_depth_range_km: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::default(),
            earth_radius_km: con::EARTH_RADIUS_KM,
            tile_size: con::TILE_SIZE,
            imagery: TileSourceConfig::satellite(),
            elevation: TileSourceConfig::terrarium(),
            terrain: TerrainConfig::default(),
            walls: WallConfig::default(),
            grid: GridConfig::default(),
            markers: MarkerConfig::default(),
            camera: CameraConfig::default(),
            loader: LoaderConfig::default(),
            min_depth_range_km: con::MIN_DEPTH_RANGE_KM,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if !(self.earth_radius_km.is_finite() && self.earth_radius_km > 0.0) {
            return Err(QuakeError::Config("earth_radius_km must be positive".to_string()));
        }
        if self.tile_size == 0 {
            return Err(QuakeError::Config("tile_size must be non-zero".to_string()));
        }
        for (name, source) in [("imagery", &self.imagery), ("elevation", &self.elevation)] {
            if source.zoom > con::MAX_ZOOM {
                return Err(QuakeError::Config(format!(
                    "{} zoom {} exceeds {}",
                    name,
                    source.zoom,
                    con::MAX_ZOOM
                )));
            }
        }
        let segment_counts = [
            ("terrain.segments", self.terrain.segments),
            ("walls.segments_along", self.walls.segments_along),
            ("walls.segments_depth", self.walls.segments_depth),
            ("walls.edge_segments", self.walls.edge_segments),
        ];
        if let Some((name, _)) = segment_counts.iter().find(|(_, count)| *count == 0) {
            return Err(QuakeError::Config(format!("{} must be non-zero", name)));
        }
        if !(self.grid.degree_step > 0.0) {
            return Err(QuakeError::Config("grid.degree_step must be positive".to_string()));
        }
        let (lo, hi) = self.markers.magnitude_domain;
        if (hi - lo).abs() < f64::EPSILON {
            return Err(QuakeError::Config("markers.magnitude_domain is empty".to_string()));
        }
        Ok(())
    }
}

/// One raster tile provider and the detail it is fetched at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSourceConfig {
    pub url_template: UrlTemplate,
    pub zoom: u8,
    /// Fill painted into tiles that fail to load
    pub fallback_color: Color,
}

impl TileSourceConfig {
    pub fn satellite() -> Self {
        Self {
            url_template: UrlTemplate::satellite(con::SATELLITE_URL_BASE),
            zoom: con::SATELLITE_DETAIL,
            fallback_color: Color::from_hex(con::SATELLITE_FALLBACK_COLOR),
        }
    }

    pub fn terrarium() -> Self {
        Self {
            url_template: UrlTemplate::terrarium(con::TERRARIUM_URL_BASE),
            zoom: con::ELEVATION_DETAIL,
            fallback_color: Color::from_hex(con::TERRARIUM_FALLBACK_COLOR),
        }
    }
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self::satellite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub segments: u32,
    pub exaggeration: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            segments: con::TERRAIN_SEGMENTS,
            exaggeration: con::TERRAIN_EXAGGERATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub segments_along: u32,
    pub segments_depth: u32,
    pub edge_segments: u32,
    pub color_top: Color,
    pub color_bottom: Color,
    pub opacity_top: f32,
    pub opacity_bottom: f32,
    pub edge_color: Color,
    pub edge_opacity: f32,
}

impl WallConfig {
    /// Colour and opacity at depth fraction `t` (0 top, 1 bottom)
    pub fn shade(&self, t: f32) -> [f32; 4] {
        let t = t.clamp(0.0, 1.0);
        let color = self.color_top.lerp(&self.color_bottom, t);
        let opacity = self.opacity_top + (self.opacity_bottom - self.opacity_top) * t;
        [color.r, color.g, color.b, opacity]
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            segments_along: con::WALL_SEGMENTS_ALONG,
            segments_depth: con::WALL_SEGMENTS_DEPTH,
            edge_segments: con::EDGE_SEGMENTS,
            color_top: Color::from_hex(con::WALL_COLOR_TOP),
            color_bottom: Color::from_hex(con::WALL_COLOR_BOTTOM),
            opacity_top: con::WALL_OPACITY_TOP,
            opacity_bottom: con::WALL_OPACITY_BOTTOM,
            edge_color: Color::from_hex(con::EDGE_COLOR),
            edge_opacity: con::EDGE_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub color: Color,
    pub opacity: f32,
    pub degree_step: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(con::GRID_COLOR),
            opacity: con::GRID_OPACITY,
            degree_step: 1.0,
        }
    }
}

/// Marker size and colour ramps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub magnitude_domain: (f64, f64),
    pub scale_range: (f64, f64),
    pub hue_span: f32,
    pub saturation: f32,
    pub lightness_top: f32,
    pub lightness_span: f32,
}

impl MarkerConfig {
    /// Linear, unclamped remap of magnitude onto marker scale
    pub fn scale_for(&self, amplitude: f64) -> f64 {
        let (a1, a2) = self.magnitude_domain;
        let (b1, b2) = self.scale_range;
        b1 + (amplitude - a1) * (b2 - b1) / (a2 - a1)
    }

    /// Depth colour; `t = min(1, depth / depth_max)`
    pub fn color_for(&self, depth: f64, depth_max: f64) -> Color {
        let t = if depth_max > 0.0 {
            (depth / depth_max).min(1.0) as f32
        } else {
            0.0
        };
        Color::from_hsl(
            self.hue_span * t,
            self.saturation,
            self.lightness_top - self.lightness_span * t,
        )
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            magnitude_domain: con::MAGNITUDE_DOMAIN,
            scale_range: con::MARKER_SCALE_RANGE,
            hue_span: 0.83,
            saturation: 0.95,
            lightness_top: 0.3,
            lightness_span: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub target_depth_km: f64,
    pub aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: con::CAMERA_FOV,
            near: con::CAMERA_NEAR,
            far: con::CAMERA_FAR,
            target_depth_km: con::TARGET_DEPTH_KM,
            aspect: 800.0 / 560.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Extra attempts after the first failed tile request
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Encoded tiles kept across reloads
    pub cache_capacity: usize,
}

impl LoaderConfig {
    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_delay_ms)
    }

    pub fn for_testing() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 0,
            request_timeout_secs: 1,
            cache_capacity: 64,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 100,
            request_timeout_secs: 10,
            cache_capacity: 512,
        }
    }
}
