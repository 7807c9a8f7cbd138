//! Terrarium elevation decoding and map-space sampling

use crate::core::geo::{lon_lat_to_global_pixel, MapSpace};
use crate::tiles::fetcher::RasterBuffer;
use std::sync::Arc;

/// Bias applied by the Terrarium encoding, in metres
pub const TERRARIUM_OFFSET_M: f64 = 32768.0;

/// Decodes one Terrarium pixel into signed metres.
///
/// `meters = r * 256 + g + b / 256 - 32768`
pub fn decode_elevation_meters(r: u8, g: u8, b: u8) -> f64 {
    r as f64 * 256.0 + g as f64 + b as f64 / 256.0 - TERRARIUM_OFFSET_M
}

/// Anything that yields a surface height (km, display-scaled) for a map-space position
pub trait ElevationSource {
    fn elevation_at(&self, x: f64, y: f64) -> f64;
}

impl<F> ElevationSource for F
where
    F: Fn(f64, f64) -> f64,
{
    fn elevation_at(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Height source for the not-yet-loaded terrain
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatElevation;

impl ElevationSource for FlatElevation {
    fn elevation_at(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }
}

/// Samples elevation in kilometres times `exaggeration` at map-space `(x, y)`.
///
/// Returns 0 without a raster. Positions outside the raster clamp to the
/// nearest edge pixel.
pub fn sample_elevation_at(
    x: f64,
    y: f64,
    space: &MapSpace,
    raster: Option<&RasterBuffer>,
    exaggeration: f64,
) -> f64 {
    let raster = match raster {
        Some(raster) if raster.width() > 0 && raster.height() > 0 => raster,
        _ => return 0.0,
    };
    let meta = raster.meta();
    let geo = space.map_xy_to_lon_lat(x, y);
    let global = lon_lat_to_global_pixel(geo.lon, geo.lat, meta.zoom, meta.tile_size);

    let local_x = clamp_index(global.x - meta.origin_px.0, raster.width());
    let local_y = clamp_index(global.y - meta.origin_px.1, raster.height());
    let [r, g, b, _] = raster.pixel(local_x, local_y);

    decode_elevation_meters(r, g, b) / 1000.0 * exaggeration
}

fn clamp_index(value: f64, len: u32) -> u32 {
    let max = (len - 1) as f64;
    if value.is_nan() {
        return 0;
    }
    value.floor().clamp(0.0, max) as u32
}

/// Raster-backed [`ElevationSource`]
#[derive(Debug, Clone)]
pub struct ElevationSampler {
    space: MapSpace,
    raster: Option<Arc<RasterBuffer>>,
    exaggeration: f64,
}

impl ElevationSampler {
    pub fn new(space: MapSpace, raster: Option<Arc<RasterBuffer>>, exaggeration: f64) -> Self {
        Self {
            space,
            raster,
            exaggeration,
        }
    }

    /// Sampler with no raster; every height is 0
    pub fn flat(space: MapSpace) -> Self {
        Self::new(space, None, 1.0)
    }

    pub fn is_loaded(&self) -> bool {
        self.raster.is_some()
    }

    pub fn exaggeration(&self) -> f64 {
        self.exaggeration
    }
}

impl ElevationSource for ElevationSampler {
    fn elevation_at(&self, x: f64, y: f64) -> f64 {
        sample_elevation_at(x, y, &self.space, self.raster.as_deref(), self.exaggeration)
    }
}
