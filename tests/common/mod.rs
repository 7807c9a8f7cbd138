//! In-memory tile server shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use quakeview::tiles::TileClient;
use quakeview::{QuakeError, Result};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const TEMPLATE: &str = "mem://{z}/{x}/{y}";

/// Colour painted into tile `(x, y)` unless a fixed fill is set
pub fn tile_color(x: u32, y: u32) -> Rgba<u8> {
    Rgba([(x % 251) as u8, (y % 251) as u8, 200, 255])
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("png encode");
    bytes
}

/// Serves PNG tiles for `mem://{z}/{x}/{y}` URLs.
#[derive(Default)]
pub struct MemoryTileClient {
    /// `(x, y)` pairs that always fail
    failing: Mutex<HashSet<(u32, u32)>>,
    /// Remaining failures before a tile starts succeeding
    flaky: Mutex<HashMap<(u32, u32), usize>>,
    fill: Option<Rgba<u8>>,
    tile_px: Option<u32>,
    delay: Option<Duration>,
    requests: AtomicUsize,
}

impl MemoryTileClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tile is one solid colour, e.g. a Terrarium elevation
    pub fn filled(color: Rgba<u8>) -> Self {
        Self {
            fill: Some(color),
            ..Default::default()
        }
    }

    pub fn with_tile_px(mut self, px: u32) -> Self {
        self.tile_px = Some(px);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail(self, x: u32, y: u32) -> Self {
        self.failing.lock().unwrap().insert((x, y));
        self
    }

    pub fn fail_times(self, x: u32, y: u32, times: usize) -> Self {
        self.flaky.lock().unwrap().insert((x, y), times);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn parse(url: &str) -> Option<(u32, u32, u32)> {
    let path = url.strip_prefix("mem://")?.split('?').next()?;
    let mut parts = path.split('/');
    let z = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((z, x, y))
}

#[async_trait]
impl TileClient for MemoryTileClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let (_z, x, y) = parse(url).ok_or_else(|| QuakeError::Tile(format!("bad url {}", url)))?;

        if self.failing.lock().unwrap().contains(&(x, y)) {
            return Err(QuakeError::Tile(format!("HTTP 404 for {}", url)));
        }
        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(left) = flaky.get_mut(&(x, y)) {
                if *left > 0 {
                    *left -= 1;
                    return Err(QuakeError::Tile(format!("HTTP 503 for {}", url)));
                }
            }
        }

        let px = self.tile_px.unwrap_or(256);
        let color = self.fill.unwrap_or_else(|| tile_color(x, y));
        Ok(encode_png(&RgbaImage::from_pixel(px, px, color)))
    }
}
