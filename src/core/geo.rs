use crate::core::constants::{EARTH_RADIUS_KM, MAX_LATITUDE};
use crate::{QuakeError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A point in planar (projected) or map space, in kilometres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn subtract(&self, other: &MapPoint) -> MapPoint {
        MapPoint::new(self.x - other.x, self.y - other.y)
    }

    pub fn add(&self, other: &MapPoint) -> MapPoint {
        MapPoint::new(self.x + other.x, self.y + other.y)
    }
}

/// A point in slippy-map global pixel space at some zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalPixel {
    pub x: f64,
    pub y: f64,
}

/// Geographic extent of the whole scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl GeoBounds {
    /// Creates validated bounds
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Result<Self> {
        let bounds = Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks ordering and the Mercator latitude limit
    pub fn validate(&self) -> Result<()> {
        let finite = [self.lon_min, self.lon_max, self.lat_min, self.lat_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(QuakeError::InvalidBounds(format!("{:?} is not finite", self)));
        }
        if self.lon_min >= self.lon_max {
            return Err(QuakeError::InvalidBounds(format!(
                "lonMin {} must be below lonMax {}",
                self.lon_min, self.lon_max
            )));
        }
        if self.lat_min >= self.lat_max {
            return Err(QuakeError::InvalidBounds(format!(
                "latMin {} must be below latMax {}",
                self.lat_min, self.lat_max
            )));
        }
        if self.lat_min <= -MAX_LATITUDE || self.lat_max >= MAX_LATITUDE {
            return Err(QuakeError::InvalidBounds(format!(
                "latitudes must stay inside ±{}",
                MAX_LATITUDE
            )));
        }
        if self.lon_min < -180.0 || self.lon_max > 180.0 {
            return Err(QuakeError::InvalidBounds(
                "longitudes must stay inside ±180".to_string(),
            ));
        }
        Ok(())
    }

    /// North-west corner, the top-left of any raster covering the bounds
    pub fn top_left(&self) -> LonLat {
        LonLat::new(self.lon_min, self.lat_max)
    }

    /// South-east corner
    pub fn bottom_right(&self) -> LonLat {
        LonLat::new(self.lon_max, self.lat_min)
    }

    /// South-west corner, the map-space origin
    pub fn origin(&self) -> LonLat {
        LonLat::new(self.lon_min, self.lat_min)
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }

    pub fn contains(&self, point: &LonLat) -> bool {
        point.lon >= self.lon_min
            && point.lon <= self.lon_max
            && point.lat >= self.lat_min
            && point.lat <= self.lat_max
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        let (lon_min, lon_max, lat_min, lat_max) = crate::core::constants::DEFAULT_BOUNDS;
        Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Creates a tile coordinate from a geographic position and zoom level
    pub fn from_lon_lat(lon: f64, lat: f64, zoom: u8) -> Self {
        lon_lat_to_tile_index(lon, lat, zoom)
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = 2_u64.pow(self.z as u32);
        (self.x as u64) < max_coord && (self.y as u64) < max_coord
    }
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Spherical Web Mercator forward projection, in kilometres for `radius` in km.
///
/// Undefined at the poles; callers keep latitude inside `(-90, 90)`.
pub fn lon_lat_to_plane(lon: f64, lat: f64, radius: f64) -> MapPoint {
    let x = radius * degrees_to_radians(lon);
    let y = radius * (PI / 4.0 + degrees_to_radians(lat) / 2.0).tan().ln();
    MapPoint::new(x, y)
}

/// Inverse of [`lon_lat_to_plane`]
pub fn plane_to_lon_lat(x: f64, y: f64, radius: f64) -> LonLat {
    let lon = (x / radius) * (180.0 / PI);
    let lat = (y / radius).sinh().atan() * (180.0 / PI);
    LonLat::new(lon, lat)
}

/// Slippy-map global pixel position at `zoom`
pub fn lon_lat_to_global_pixel(lon: f64, lat: f64, zoom: u8, tile_size: u32) -> GlobalPixel {
    let world = 2_f64.powi(zoom as i32) * tile_size as f64;
    let (fx, fy) = normalized_tile_fraction(lon, lat);
    GlobalPixel {
        x: fx * world,
        y: fy * world,
    }
}

/// Tile containing the position at `zoom`, clamped to the valid tile grid
pub fn lon_lat_to_tile_index(lon: f64, lat: f64, zoom: u8) -> TileCoord {
    let n = 2_f64.powi(zoom as i32);
    let (fx, fy) = normalized_tile_fraction(lon, lat);
    let max_index = n - 1.0;
    let x = (fx * n).floor().clamp(0.0, max_index) as u32;
    let y = (fy * n).floor().clamp(0.0, max_index) as u32;
    TileCoord::new(x, y, zoom)
}

/// Absolute planar extent spanned by the bounds' opposite corners
pub fn bounds_to_map_size(bounds: &GeoBounds, radius: f64) -> (f64, f64) {
    let min = lon_lat_to_plane(bounds.lon_min, bounds.lat_min, radius);
    let max = lon_lat_to_plane(bounds.lon_max, bounds.lat_max, radius);
    ((max.x - min.x).abs(), (max.y - min.y).abs())
}

// Position in [0, 1) across the world, y growing southwards.
fn normalized_tile_fraction(lon: f64, lat: f64) -> (f64, f64) {
    let lat_rad = degrees_to_radians(lat);
    let fx = (lon + 180.0) / 360.0;
    let fy = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (fx, fy)
}

/// Planar map coordinate system anchored at the bounds' south-west corner.
///
/// Width and height are derived once from the bounds; a new `MapSpace` is
/// built whenever the bounds change.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSpace {
    bounds: GeoBounds,
    radius: f64,
    origin: MapPoint,
    width: f64,
    height: f64,
}

impl MapSpace {
    pub fn new(bounds: GeoBounds, radius: f64) -> Result<Self> {
        bounds.validate()?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(QuakeError::Config(format!("earth radius {} must be positive", radius)));
        }
        let origin = lon_lat_to_plane(bounds.lon_min, bounds.lat_min, radius);
        let (width, height) = bounds_to_map_size(&bounds, radius);
        Ok(Self {
            bounds,
            radius,
            origin,
            width,
            height,
        })
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Planar coordinate of the map origin
    pub fn origin(&self) -> MapPoint {
        self.origin
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> MapPoint {
        MapPoint::new(self.width * 0.5, self.height * 0.5)
    }

    /// Geographic position to map space; `(lon_min, lat_min)` lands on `(0, 0)`
    pub fn lon_lat_to_map_xy(&self, lon: f64, lat: f64) -> MapPoint {
        lon_lat_to_plane(lon, lat, self.radius).subtract(&self.origin)
    }

    /// Map space back to geographic position
    pub fn map_xy_to_lon_lat(&self, x: f64, y: f64) -> LonLat {
        let absolute = self.origin.add(&MapPoint::new(x, y));
        plane_to_lon_lat(absolute.x, absolute.y, self.radius)
    }

    /// Map-space distance covered by `degrees` of longitude at the bounds' centre
    pub fn longitude_step(&self, degrees: f64) -> f64 {
        let center = self.bounds.center();
        let a = lon_lat_to_plane(center.lon, center.lat, self.radius);
        let b = lon_lat_to_plane(center.lon + degrees, center.lat, self.radius);
        b.x - a.x
    }
}

impl Default for MapSpace {
    fn default() -> Self {
        let bounds = GeoBounds::default();
        let origin = lon_lat_to_plane(bounds.lon_min, bounds.lat_min, EARTH_RADIUS_KM);
        let (width, height) = bounds_to_map_size(&bounds, EARTH_RADIUS_KM);
        Self {
            bounds,
            radius: EARTH_RADIUS_KM,
            origin,
            width,
            height,
        }
    }
}
