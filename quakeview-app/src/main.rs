use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use quakeview::{
    data::{self, DatasetQuery},
    RasterFetcher, SceneConfig, SceneManager, ScenePreset,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Balanced,
    Low,
    High,
}

/// Builds the earthquake scene headlessly and reports what would be drawn
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON scene configuration; overrides --preset
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Balanced)]
    preset: Preset,

    /// GeoJSON file or JSON array of query rows
    #[arg(long)]
    data: Option<PathBuf>,

    /// Dataset query endpoint, used when --data is absent
    #[arg(long)]
    query_url: Option<String>,

    /// Dataset name passed to the query endpoint
    #[arg(long)]
    dataset: Option<String>,

    /// Write the stitched imagery raster here (PNG)
    #[arg(long)]
    texture_out: Option<PathBuf>,

    /// Give up waiting for rasters after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SceneConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match args.preset {
            Preset::Balanced => ScenePreset::Balanced,
            Preset::Low => ScenePreset::LowDetail,
            Preset::High => ScenePreset::HighDetail,
        }
        .resolve(),
    };

    let mut scene = SceneManager::new(config.clone())?;

    let dataset = if let Some(path) = &args.data {
        Some(data::from_path(path))
    } else if let Some(url) = &args.query_url {
        let mut query = DatasetQuery::new(url.clone());
        if let Some(name) = &args.dataset {
            query = query.with_dataset(name.clone());
        }
        Some(query.fetch().await)
    } else {
        None
    };
    if let Some(result) = dataset {
        scene.set_dataset_result(result);
        if let Some(message) = scene.last_error() {
            log::warn!("continuing without events: {}", message);
        }
    }

    let fetcher = Arc::new(RasterFetcher::http(&config));
    scene.start_loading(Arc::clone(&fetcher))?;

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    let mut interval = tokio::time::interval(Duration::from_millis(16));
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                scene.dispose();
                bail!("interrupted");
            }
        }
        scene.update();
        let settled = scene.is_ready() && scene.imagery().is_some();
        if settled || !scene.loads_pending() {
            scene.update();
            break;
        }
        if Instant::now() > deadline {
            scene.dispose();
            bail!("rasters did not arrive within {} s", args.timeout_secs);
        }
    }

    if !scene.is_ready() {
        bail!(
            "terrain did not load: {}",
            scene.last_error().unwrap_or("no elevation raster")
        );
    }

    let geometry = scene.geometry();
    log::info!(
        "map {:.1} x {:.1} km, depth range {:.1} km",
        scene.space().width(),
        scene.space().height(),
        scene.depth_range()
    );
    log::info!(
        "terrain {} vertices / {} triangles, {} walls, {} edge lines, {} grid segments, {} markers",
        geometry.terrain.vertex_count(),
        geometry.terrain.triangle_count(),
        geometry.walls.len(),
        geometry.edges.len(),
        geometry.grid.as_ref().map(|g| g.segment_count()).unwrap_or(0),
        geometry.markers.count()
    );
    log::info!("tile cache holds {} tiles", fetcher.cache().len());

    if let Some(path) = &args.texture_out {
        match scene.imagery() {
            Some(imagery) => {
                imagery
                    .image()
                    .save(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                log::info!("imagery written to {}", path.display());
            }
            None => log::warn!("no imagery raster to write"),
        }
    }

    scene.dispose();
    Ok(())
}
