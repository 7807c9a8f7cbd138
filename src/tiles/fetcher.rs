//! Tile-fetch-and-stitch pipeline
//!
//! A raster covering a [`GeoBounds`] is built in four steps: compute the
//! covering tile rectangle, fetch every tile concurrently, paint each result
//! (or the fallback fill) into one canvas once all of them have settled, and
//! crop the canvas to the exact pixel window of the bounds.

use super::cache::TileCache;
use super::client::TileClient;
use super::source::TileSource;
use crate::core::config::{LoaderConfig, TileSourceConfig};
use crate::core::geo::{lon_lat_to_global_pixel, lon_lat_to_tile_index, GeoBounds, TileCoord};
use crate::{QuakeError, Result};
use futures::future::join_all;
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;

/// Largest canvas side accepted before allocation is refused
pub const MAX_CANVAS_SIDE: u32 = 32_767;

/// Inclusive tile rectangle at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Tiles covering the bounds, from the top-left and bottom-right corners.
    ///
    /// Both axes are min/max-ed because the corner order can invert.
    pub fn covering(bounds: &GeoBounds, zoom: u8) -> Self {
        let tl = bounds.top_left();
        let br = bounds.bottom_right();
        let a = lon_lat_to_tile_index(tl.lon, tl.lat, zoom);
        let b = lon_lat_to_tile_index(br.lon, br.lat, zoom);
        Self {
            x_min: a.x.min(b.x),
            x_max: a.x.max(b.x),
            y_min: a.y.min(b.y),
            y_max: a.y.max(b.y),
            zoom,
        }
    }

    pub fn cols(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    pub fn len(&self) -> usize {
        self.cols() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major tile coordinates
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.y_min..=self.y_max)
            .flat_map(move |y| (self.x_min..=self.x_max).map(move |x| TileCoord::new(x, y, self.zoom)))
    }

    /// Top-left pixel of `coord` inside the composed canvas
    pub fn offset_of(&self, coord: &TileCoord, tile_size: u32) -> (u32, u32) {
        (
            (coord.x - self.x_min) * tile_size,
            (coord.y - self.y_min) * tile_size,
        )
    }

    /// Composed canvas size, refusing sizes no canvas can hold
    pub fn canvas_size(&self, tile_size: u32) -> Result<(u32, u32)> {
        let width = self.cols().checked_mul(tile_size);
        let height = self.rows().checked_mul(tile_size);
        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 && w <= MAX_CANVAS_SIDE && h <= MAX_CANVAS_SIDE => {
                Ok((w, h))
            }
            _ => Err(QuakeError::Canvas(format!(
                "{}x{} tiles of {} px do not fit a canvas",
                self.cols(),
                self.rows(),
                tile_size
            ))),
        }
    }
}

/// Pixel window of the bounds inside the composed canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn new(bounds: &GeoBounds, range: &TileRange, tile_size: u32) -> Self {
        let tl = bounds.top_left();
        let br = bounds.bottom_right();
        let a = lon_lat_to_global_pixel(tl.lon, tl.lat, range.zoom, tile_size);
        let b = lon_lat_to_global_pixel(br.lon, br.lat, range.zoom, tile_size);

        let (px_min, px_max) = (a.x.min(b.x), a.x.max(b.x));
        let (py_min, py_max) = (a.y.min(b.y), a.y.max(b.y));
        let canvas_x0 = range.x_min as f64 * tile_size as f64;
        let canvas_y0 = range.y_min as f64 * tile_size as f64;

        Self {
            x: (px_min - canvas_x0).round().max(0.0) as u32,
            y: (py_min - canvas_y0).round().max(0.0) as u32,
            width: (px_max - px_min).round().max(0.0) as u32,
            height: (py_max - py_min).round().max(0.0) as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Which tile-space region and resolution a raster covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterMeta {
    pub tile_x_min: u32,
    pub tile_y_min: u32,
    pub cols: u32,
    pub rows: u32,
    pub tile_size: u32,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    /// Global-pixel position of the raster's top-left pixel
    pub origin_px: (f64, f64),
}

/// Stitched RGBA raster plus the metadata needed to sample it.
///
/// Pixels and metadata are only ever created and replaced together.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    image: RgbaImage,
    meta: RasterMeta,
}

impl RasterBuffer {
    pub fn new(image: RgbaImage, meta: RasterMeta) -> Self {
        Self { image, meta }
    }

    pub fn meta(&self) -> &RasterMeta {
        &self.meta
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at raster-local coordinates; both must be in range
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Raw RGBA8 buffer, row-major from the top-left
    pub fn rgba_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Fetches and stitches tile rasters through a [`TileClient`]
pub struct RasterFetcher<C: TileClient> {
    client: C,
    cache: TileCache,
    config: LoaderConfig,
    tile_size: u32,
}

impl<C: TileClient> RasterFetcher<C> {
    pub fn new(client: C, config: LoaderConfig, tile_size: u32) -> Self {
        let cache = TileCache::new(config.cache_capacity);
        Self {
            client,
            cache,
            config,
            tile_size,
        }
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Raster for one configured tile source
    pub async fn fetch_source(&self, bounds: &GeoBounds, source: &TileSourceConfig) -> Result<RasterBuffer> {
        self.fetch_raster(
            bounds,
            source.zoom,
            &source.url_template,
            source.fallback_color.to_rgba8(),
        )
        .await
    }

    /// Fetches, stitches and crops the raster covering `bounds` at `zoom`.
    ///
    /// Failed tiles are filled with `fallback`; only an impossible canvas is
    /// an error.
    pub async fn fetch_raster(
        &self,
        bounds: &GeoBounds,
        zoom: u8,
        source: &dyn TileSource,
        fallback: Rgba<u8>,
    ) -> Result<RasterBuffer> {
        let (range, canvas) = self.fetch_composite(bounds, zoom, source, fallback).await?;
        let tile_size = self.tile_size;
        let crop = CropWindow::new(bounds, &range, tile_size);
        let tile_origin = (
            range.x_min as f64 * tile_size as f64,
            range.y_min as f64 * tile_size as f64,
        );

        let (image, origin_px) = if crop.is_empty() {
            (canvas, tile_origin)
        } else {
            let cropped = imageops::crop_imm(&canvas, crop.x, crop.y, crop.width, crop.height).to_image();
            (
                cropped,
                (tile_origin.0 + crop.x as f64, tile_origin.1 + crop.y as f64),
            )
        };

        let meta = RasterMeta {
            tile_x_min: range.x_min,
            tile_y_min: range.y_min,
            cols: range.cols(),
            rows: range.rows(),
            tile_size,
            zoom,
            width: image.width(),
            height: image.height(),
            origin_px,
        };
        log::info!(
            "raster z{} ready: {}x{} px from {} tiles",
            zoom,
            meta.width,
            meta.height,
            range.len()
        );
        Ok(RasterBuffer::new(image, meta))
    }

    /// Uncropped composite of every tile in the covering range
    pub async fn fetch_composite(
        &self,
        bounds: &GeoBounds,
        zoom: u8,
        source: &dyn TileSource,
        fallback: Rgba<u8>,
    ) -> Result<(TileRange, RgbaImage)> {
        let tile_size = self.tile_size;
        let range = TileRange::covering(bounds, zoom);
        let (width, height) = range.canvas_size(tile_size)?;
        let mut canvas = RgbaImage::new(width, height);
        let source_key = source.cache_key();

        let pending = range.coords().map(|coord| {
            let url = source.url(coord);
            let source_key = source_key.as_str();
            async move {
                let tile = self.load_tile(source_key, coord, &url).await;
                (coord, tile)
            }
        });

        // Every slot must settle before the canvas is valid.
        let settled = join_all(pending).await;

        let mut failed = 0usize;
        for (coord, tile) in settled {
            let (ox, oy) = range.offset_of(&coord, tile_size);
            match tile {
                Some(image) => imageops::replace(&mut canvas, &image, ox as i64, oy as i64),
                None => {
                    failed += 1;
                    fill_rect(&mut canvas, ox, oy, tile_size, tile_size, fallback);
                }
            }
        }
        if failed > 0 {
            log::warn!("{} of {} tiles at z{} used the fallback fill", failed, range.len(), zoom);
        }

        Ok((range, canvas))
    }

    async fn load_tile(&self, source_key: &str, coord: TileCoord, url: &str) -> Option<RgbaImage> {
        if let Some(bytes) = self.cache.get(source_key, &coord) {
            if let Some(image) = self.decode_tile(coord, &bytes) {
                return Some(image);
            }
        }

        let bytes = self.fetch_with_retry(coord, url).await?;
        let image = self.decode_tile(coord, &bytes)?;
        self.cache.insert(source_key, coord, Arc::new(bytes));
        Some(image)
    }

    async fn fetch_with_retry(&self, coord: TileCoord, url: &str) -> Option<Vec<u8>> {
        let attempts = self.config.max_retries + 1;
        for attempt in 1..=attempts {
            log::debug!("fetch tile {:?} attempt {}", coord, attempt);
            match self.client.fetch(url).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => {
                    log::warn!("tile {:?} download failed on attempt {}: {}", coord, attempt, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }
        None
    }

    fn decode_tile(&self, coord: TileCoord, bytes: &[u8]) -> Option<RgbaImage> {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                log::warn!("tile {:?} failed to decode: {}", coord, e);
                return None;
            }
        };
        let size = self.tile_size;
        if image.width() == size && image.height() == size {
            Some(image)
        } else {
            // Nearest keeps packed elevation values intact.
            Some(imageops::resize(&image, size, size, imageops::FilterType::Nearest))
        }
    }
}

#[cfg(feature = "http")]
impl RasterFetcher<super::client::HttpTileClient> {
    /// Fetcher over real HTTP tile servers using the scene's loader settings
    pub fn http(config: &crate::core::config::SceneConfig) -> Self {
        let timeout = std::time::Duration::from_secs(config.loader.request_timeout_secs);
        let client = super::client::HttpTileClient::new(timeout);
        Self::new(client, config.loader.clone(), config.tile_size)
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_and_crop_at_zoom_8() {
        let bounds = GeoBounds::new(118.0, 126.0, 20.0, 27.0).unwrap();
        let range = TileRange::covering(&bounds, 8);
        assert_eq!((range.x_min, range.x_max), (211, 217));
        assert_eq!((range.y_min, range.y_max), (108, 113));
        assert_eq!(range.canvas_size(256).unwrap(), (7 * 256, 6 * 256));

        let crop = CropWindow::new(&bounds, &range, 256);
        assert_eq!(crop, CropWindow { x: 233, y: 12, width: 1456, height: 1391 });
        assert!(crop.x + crop.width <= 7 * 256);
        assert!(crop.y + crop.height <= 6 * 256);
    }

    #[test]
    fn test_range_and_crop_at_zoom_5() {
        let bounds = GeoBounds::new(118.0, 126.0, 20.0, 27.0).unwrap();
        let range = TileRange::covering(&bounds, 5);
        assert_eq!((range.cols(), range.rows()), (2, 2));
        let crop = CropWindow::new(&bounds, &range, 256);
        assert_eq!(crop, CropWindow { x: 125, y: 130, width: 182, height: 174 });
    }

    #[test]
    fn test_coords_row_major() {
        let range = TileRange { x_min: 3, x_max: 4, y_min: 7, y_max: 8, zoom: 4 };
        let coords: Vec<_> = range.coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(3, 7), (4, 7), (3, 8), (4, 8)]);
        assert_eq!(range.offset_of(&TileCoord::new(4, 8, 4), 256), (256, 256));
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let range = TileRange { x_min: 0, x_max: 199, y_min: 0, y_max: 0, zoom: 8 };
        assert!(matches!(range.canvas_size(256), Err(QuakeError::Canvas(_))));
    }

    #[test]
    fn test_fill_rect_clipped() {
        let mut canvas = RgbaImage::new(4, 4);
        fill_rect(&mut canvas, 2, 2, 8, 8, Rgba([9, 9, 9, 255]));
        assert_eq!(canvas.get_pixel(3, 3).0, [9, 9, 9, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }
}
