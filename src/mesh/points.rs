//! Instanced earthquake markers.

use crate::core::config::MarkerConfig;
use crate::core::geo::MapSpace;
use crate::data::earthquake::Earthquake;
use nalgebra::{Matrix4, Vector3};

/// One marker's placement and uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 3],
}

impl MarkerInstance {
    /// Column-major model matrix (translation times uniform scale)
    pub fn transform(&self) -> Matrix4<f32> {
        let [x, y, z] = self.position;
        Matrix4::new_translation(&Vector3::new(x, y, z)) * Matrix4::new_scaling(self.scale)
    }
}

/// Places an event directly below the flat surface datum at `-depth`.
pub fn marker_for(event: &Earthquake, space: &MapSpace, depth_max: f64, config: &MarkerConfig) -> MarkerInstance {
    let p = space.lon_lat_to_map_xy(event.lon, event.lat);
    MarkerInstance {
        position: [p.x as f32, p.y as f32, -event.depth as f32],
        scale: config.scale_for(event.amplitude) as f32,
        color: config.color_for(event.depth, depth_max).to_array(),
    }
}

/// Growable instance arrays for the marker set.
///
/// Slots beyond `count` keep stale data and are never drawn. Both dirty flags
/// are raised by every [`InstanceBuffer::write`] and cleared by the uploader.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuffer {
    transforms: Vec<[f32; 16]>,
    colors: Vec<[f32; 3]>,
    instances: Vec<MarkerInstance>,
    count: usize,
    transforms_dirty: bool,
    colors_dirty: bool,
}

impl InstanceBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transforms: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            instances: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Rewrites every slot from `events`; afterwards `count() == events.len()`.
    pub fn write(&mut self, events: &[Earthquake], space: &MapSpace, depth_max: f64, config: &MarkerConfig) {
        let n = events.len();
        if self.transforms.len() < n {
            self.transforms.resize(n, [0.0; 16]);
            self.colors.resize(n, [0.0; 3]);
        }
        self.instances.clear();
        for (index, event) in events.iter().enumerate() {
            let marker = marker_for(event, space, depth_max, config);
            let mut matrix = [0.0f32; 16];
            matrix.copy_from_slice(marker.transform().as_slice());
            self.transforms[index] = matrix;
            self.colors[index] = marker.color;
            self.instances.push(marker);
        }
        self.count = n;
        self.transforms_dirty = true;
        self.colors_dirty = true;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.transforms.len()
    }

    pub fn instance(&self, index: usize) -> Option<&MarkerInstance> {
        self.instances.get(index)
    }

    pub fn instances(&self) -> &[MarkerInstance] {
        &self.instances
    }

    /// Active transforms, column-major
    pub fn transforms(&self) -> &[[f32; 16]] {
        &self.transforms[..self.count]
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors[..self.count]
    }

    pub fn transform_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.transforms())
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.colors())
    }

    pub fn needs_upload(&self) -> (bool, bool) {
        (self.transforms_dirty, self.colors_dirty)
    }

    pub fn mark_uploaded(&mut self) {
        self.transforms_dirty = false;
        self.colors_dirty = false;
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.count = 0;
        self.transforms_dirty = true;
        self.colors_dirty = true;
    }
}

/// Vertical extent of the box: the deepest event, never less than `floor`
pub fn depth_range(events: &[Earthquake], floor: f64) -> f64 {
    events.iter().map(|e| e.depth).fold(floor, f64::max)
}
