//! Long-lived owner of everything the earthquake box renders

use super::camera::PerspectiveCamera;
use super::highlight::{HighlightPulse, PulseFrame};
use super::picking::{pick_tooltip, Tooltip, ViewportRect};
use crate::core::config::SceneConfig;
use crate::core::constants::WORLD_SCALE_RANGE;
use crate::core::geo::MapSpace;
use crate::data::earthquake::Earthquake;
use crate::elevation::ElevationSampler;
use crate::mesh::geometry::{LineGeometry, MeshGeometry};
use crate::mesh::grid::build_grid;
use crate::mesh::points::{depth_range, InstanceBuffer};
use crate::mesh::terrain::build_terrain;
use crate::mesh::walls::{build_wall_edges, build_walls, Wall};
use crate::runtime::{self, AsyncHandle};
use crate::tiles::client::TileClient;
use crate::tiles::fetcher::{RasterBuffer, RasterFetcher};
use crate::{QuakeError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Terrain load progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainState {
    /// Nothing requested; terrain is flat
    Empty,
    /// Rasters for `generation` are in flight; terrain stays flat
    Fetching { generation: u64 },
    /// Elevation raster and its metadata are installed
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RasterKind {
    Imagery,
    Elevation,
}

struct LoadResult {
    generation: u64,
    kind: RasterKind,
    raster: Result<RasterBuffer>,
}

/// Every buffer the renderer draws, rebuilt as one unit
#[derive(Debug, Clone, Default)]
pub struct SceneGeometry {
    pub terrain: MeshGeometry,
    pub walls: Vec<Wall>,
    pub edges: Vec<LineGeometry>,
    pub grid: Option<LineGeometry>,
    pub markers: InstanceBuffer,
}

impl SceneGeometry {
    pub fn is_empty(&self) -> bool {
        self.terrain.positions.is_empty() && self.walls.is_empty() && self.markers.count() == 0
    }
}

/// Owns configuration, dataset, rasters and geometry for one view.
///
/// Raster loads run in the background and report over a channel; the owner's
/// frame loop calls [`SceneManager::update`] to apply them. Each result carries
/// the generation that requested it, and anything from an older generation or
/// arriving after [`SceneManager::dispose`] is dropped untouched.
pub struct SceneManager {
    config: SceneConfig,
    space: MapSpace,
    camera: PerspectiveCamera,
    events: Vec<Earthquake>,
    depth_range: f64,
    state: TerrainState,
    generation: u64,
    alive: bool,
    elevation: Option<Arc<RasterBuffer>>,
    imagery: Option<Arc<RasterBuffer>>,
    geometry: SceneGeometry,
    world_scale: [f32; 3],
    highlight: Option<HighlightPulse>,
    last_error: Option<String>,
    rebuilds: u64,
    result_tx: Sender<LoadResult>,
    result_rx: Receiver<LoadResult>,
    handles: Vec<Box<dyn AsyncHandle>>,
}

impl SceneManager {
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let space = MapSpace::new(config.bounds, config.earth_radius_km)?;
        let camera = PerspectiveCamera::for_map(&space, &config.camera);
        let (result_tx, result_rx) = unbounded();
        let depth_range = config.min_depth_range_km;

        let mut manager = Self {
            config,
            space,
            camera,
            events: Vec::new(),
            depth_range,
            state: TerrainState::Empty,
            generation: 0,
            alive: true,
            elevation: None,
            imagery: None,
            geometry: SceneGeometry::default(),
            world_scale: [1.0; 3],
            highlight: None,
            last_error: None,
            rebuilds: 0,
            result_tx,
            result_rx,
            handles: Vec::new(),
        };
        manager.rebuild();
        Ok(manager)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn space(&self) -> &MapSpace {
        &self.space
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn events(&self) -> &[Earthquake] {
        &self.events
    }

    pub fn depth_range(&self) -> f64 {
        self.depth_range
    }

    pub fn state(&self) -> TerrainState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == TerrainState::Ready
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut SceneGeometry {
        &mut self.geometry
    }

    pub fn imagery(&self) -> Option<&RasterBuffer> {
        self.imagery.as_deref()
    }

    pub fn elevation(&self) -> Option<&RasterBuffer> {
        self.elevation.as_deref()
    }

    pub fn world_scale(&self) -> [f32; 3] {
        self.world_scale
    }

    /// Message for the inline error display, if the last dataset or load failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of full geometry rebuilds so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// True while any background load of the current generation is running
    pub fn loads_pending(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Replaces the dataset; depth range, walls, grid and markers follow it.
    pub fn set_events(&mut self, events: Vec<Earthquake>) {
        if !self.alive {
            return;
        }
        self.depth_range = depth_range(&events, self.config.min_depth_range_km);
        self.events = events;
        if let Some(pulse) = &self.highlight {
            if pulse.event_index >= self.events.len() {
                self.highlight = None;
            }
        }
        log::info!(
            "dataset set: {} events, depth range {:.1} km",
            self.events.len(),
            self.depth_range
        );
        self.rebuild();
    }

    /// Applies the outcome of a dataset load. A failure keeps the current
    /// layers and is only recorded for display.
    pub fn set_dataset_result(&mut self, result: Result<Vec<Earthquake>>) {
        match result {
            Ok(events) => {
                self.last_error = None;
                self.set_events(events);
            }
            Err(e) => {
                log::error!("dataset load failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Starts fetching imagery and elevation for the configured bounds.
    ///
    /// Any loads still running for an older generation are cancelled.
    pub fn start_loading<C>(&mut self, fetcher: Arc<RasterFetcher<C>>) -> Result<()>
    where
        C: TileClient + 'static,
    {
        if !self.alive {
            return Err(QuakeError::Runtime("scene has been disposed".to_string()));
        }
        if !runtime::has_runtime() {
            return Err(QuakeError::Runtime("no tokio runtime to load rasters on".to_string()));
        }
        self.cancel_loads();
        self.generation += 1;
        let generation = self.generation;

        let jobs = [
            (RasterKind::Imagery, self.config.imagery.clone()),
            (RasterKind::Elevation, self.config.elevation.clone()),
        ];
        for (kind, source) in jobs {
            let fetcher = Arc::clone(&fetcher);
            let tx = self.result_tx.clone();
            let bounds = self.config.bounds;
            let handle = runtime::spawn(async move {
                let raster = fetcher.fetch_source(&bounds, &source).await;
                // The receiver is gone once the manager is dropped.
                let _ = tx.send(LoadResult {
                    generation,
                    kind,
                    raster,
                });
            })?;
            self.handles.push(handle);
        }

        if self.state != TerrainState::Ready {
            self.state = TerrainState::Fetching { generation };
        }
        log::info!("terrain load started (generation {})", generation);
        Ok(())
    }

    /// Applies every load result that has arrived. Returns how many were used.
    pub fn update(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.result_rx.try_recv() {
            if !self.alive {
                continue;
            }
            if result.generation != self.generation {
                log::warn!(
                    "dropping {:?} raster from stale generation {} (current {})",
                    result.kind,
                    result.generation,
                    self.generation
                );
                continue;
            }
            match (result.kind, result.raster) {
                (RasterKind::Elevation, Ok(raster)) => self.apply_elevation(raster),
                (RasterKind::Imagery, Ok(raster)) => self.apply_imagery(raster),
                (kind, Err(e)) => {
                    log::error!("{:?} raster failed: {}", kind, e);
                    self.last_error = Some(e.to_string());
                    if kind == RasterKind::Elevation && self.state != TerrainState::Ready {
                        self.state = TerrainState::Empty;
                    }
                }
            }
            applied += 1;
        }
        if self.handles.iter().all(|h| h.is_finished()) {
            self.handles.clear();
        }
        applied
    }

    /// Installs an elevation raster and rebuilds everything that depends on it
    pub fn apply_elevation(&mut self, raster: RasterBuffer) {
        if !self.alive {
            return;
        }
        let meta = raster.meta();
        log::info!(
            "elevation ready: {}x{} px at z{}",
            meta.width,
            meta.height,
            meta.zoom
        );
        self.elevation = Some(Arc::new(raster));
        self.state = TerrainState::Ready;
        self.rebuild();
    }

    /// Installs the draped imagery; geometry is unaffected
    pub fn apply_imagery(&mut self, raster: RasterBuffer) {
        if !self.alive {
            return;
        }
        log::info!("imagery ready: {}x{} px", raster.width(), raster.height());
        self.imagery = Some(Arc::new(raster));
    }

    /// Per-axis scale of the world group, each clamped to the slider range
    pub fn set_world_scale(&mut self, x: f64, y: f64, z: f64) {
        let (lo, hi) = WORLD_SCALE_RANGE;
        self.world_scale = [
            x.clamp(lo, hi) as f32,
            y.clamp(lo, hi) as f32,
            z.clamp(lo, hi) as f32,
        ];
    }

    /// Tooltip for the marker under the pointer, or `None` to hide it
    pub fn pick(&self, rect: &ViewportRect, client_x: f64, client_y: f64) -> Option<Tooltip> {
        if !self.alive {
            return None;
        }
        pick_tooltip(
            &self.camera,
            rect,
            client_x,
            client_y,
            self.geometry.markers.instances(),
            &self.events,
            self.world_scale,
        )
    }

    /// Selects the event to pulse; `None` or an unknown index clears it
    pub fn highlight(&mut self, index: Option<usize>) {
        self.highlight = index.and_then(|i| {
            self.events
                .get(i)
                .map(|event| HighlightPulse::new(i, event, &self.space))
        });
    }

    pub fn highlighted(&self) -> Option<&HighlightPulse> {
        self.highlight.as_ref()
    }

    /// Advances the highlight animation by one frame
    pub fn step_highlight(&mut self) -> Option<PulseFrame> {
        self.highlight.as_mut().map(HighlightPulse::step)
    }

    /// Tears the scene down. In-flight loads are cancelled and any result that
    /// still arrives is ignored.
    pub fn dispose(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.cancel_loads();
        self.geometry = SceneGeometry::default();
        self.elevation = None;
        self.imagery = None;
        self.highlight = None;
        self.state = TerrainState::Empty;
        log::debug!("scene disposed at generation {}", self.generation);
    }

    fn cancel_loads(&mut self) {
        for handle in self.handles.drain(..) {
            handle.cancel();
        }
    }

    /// Builds a complete new geometry set, then swaps it in.
    fn rebuild(&mut self) {
        let sampler = ElevationSampler::new(
            self.space.clone(),
            self.elevation.clone(),
            self.config.terrain.exaggeration,
        );
        let walls_config = &self.config.walls;

        let mut markers = std::mem::take(&mut self.geometry.markers);
        markers.write(&self.events, &self.space, self.depth_range, &self.config.markers);

        let next = SceneGeometry {
            terrain: build_terrain(&self.space, self.config.terrain.segments, &sampler),
            walls: build_walls(&self.space, self.depth_range, &sampler, walls_config),
            edges: build_wall_edges(
                &self.space,
                self.depth_range,
                &sampler,
                walls_config.edge_segments,
            ),
            grid: Some(build_grid(&self.space, self.depth_range, self.config.grid.degree_step)),
            markers,
        };
        self.geometry = next;
        self.rebuilds += 1;
        log::debug!("scene rebuilt ({} events, state {:?})", self.events.len(), self.state);
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        self.cancel_loads();
    }
}
