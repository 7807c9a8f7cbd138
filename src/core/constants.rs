//! Engine-wide defaults for the earthquake scene.
//! Keeping them in a single place makes it easier to tweak the magic numbers
//! that the configuration layer falls back to.

/// Earth radius used by the planar projection, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Web Mercator latitude limit. Bounds must stay strictly inside it.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Highest zoom level accepted for tile sources.
pub const MAX_ZOOM: u8 = 22;

/// Default map extent (Taiwan and surrounding sea).
pub const DEFAULT_BOUNDS: (f64, f64, f64, f64) = (118.0, 126.0, 20.0, 27.0);

/// Zoom detail used for the satellite imagery raster.
pub const SATELLITE_DETAIL: u8 = 8;

/// Zoom detail used for the Terrarium elevation raster.
pub const ELEVATION_DETAIL: u8 = 5;

pub const SATELLITE_URL_BASE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile";
pub const TERRARIUM_URL_BASE: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";

/// Fill for satellite tiles that failed to load.
pub const SATELLITE_FALLBACK_COLOR: u32 = 0xd6d3d1;

/// Fill for elevation tiles that failed to load (decodes to ~128 m).
pub const TERRARIUM_FALLBACK_COLOR: u32 = 0x808080;

/// Vertical exaggeration applied to terrain relief.
pub const TERRAIN_EXAGGERATION: f64 = 3.0;

/// Subdivisions of the terrain plane along each axis.
pub const TERRAIN_SEGMENTS: u32 = 100;

pub const WALL_SEGMENTS_ALONG: u32 = 48;
pub const WALL_SEGMENTS_DEPTH: u32 = 24;

/// Polyline resolution for the wall outline.
pub const EDGE_SEGMENTS: u32 = 96;

/// The box never gets shallower than this, in kilometres.
pub const MIN_DEPTH_RANGE_KM: f64 = 350.0;

pub const WALL_COLOR_TOP: u32 = 0xcbb091;
pub const WALL_COLOR_BOTTOM: u32 = 0x4e342e;
pub const WALL_OPACITY_TOP: f32 = 0.22;
pub const WALL_OPACITY_BOTTOM: f32 = 0.52;
pub const EDGE_COLOR: u32 = 0x6d4c41;
pub const EDGE_OPACITY: f32 = 0.9;

pub const GRID_COLOR: u32 = 0xcccccc;
pub const GRID_OPACITY: f32 = 0.35;

/// Magnitude domain mapped onto marker scale.
pub const MAGNITUDE_DOMAIN: (f64, f64) = (1.0, 7.0);

/// Marker scale range (scene units) for the magnitude domain.
pub const MARKER_SCALE_RANGE: (f64, f64) = (0.01, 12.0);

pub const CAMERA_FOV: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 5000.0;
pub const TARGET_DEPTH_KM: f64 = 100.0;

/// Pixel offset between the pointer and the tooltip's top-left corner.
pub const TOOLTIP_OFFSET: f64 = 12.0;

/// Row cap applied by the dataset query endpoint.
pub const QUERY_ROW_LIMIT: usize = 2000;

/// World scale slider limits.
pub const WORLD_SCALE_RANGE: (f64, f64) = (0.5, 3.0);
