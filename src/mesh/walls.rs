//! Depth box around the map: four tessellated walls and their outline.

use super::geometry::{LineGeometry, MeshGeometry};
use crate::core::config::WallConfig;
use crate::core::geo::MapSpace;
use crate::elevation::ElevationSource;

/// Which bounding edge of the map a wall stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    /// `x = 0`
    West,
    /// `x = width`
    East,
    /// `y = 0`
    South,
    /// `y = height`
    North,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [WallSide::East, WallSide::North, WallSide::West, WallSide::South];

    /// Unit vector pointing away from the box
    pub fn outward(&self) -> [f32; 3] {
        match self {
            WallSide::West => [-1.0, 0.0, 0.0],
            WallSide::East => [1.0, 0.0, 0.0],
            WallSide::South => [0.0, -1.0, 0.0],
            WallSide::North => [0.0, 1.0, 0.0],
        }
    }

    /// Map-space point at fraction `t` along the edge.
    ///
    /// East and south edges run backwards so that every wall winds
    /// counter-clockwise seen from outside.
    fn point_at(&self, space: &MapSpace, t: f64) -> (f64, f64) {
        let (w, h) = (space.width(), space.height());
        match self {
            WallSide::West => (0.0, t * h),
            WallSide::East => (w, (1.0 - t) * h),
            WallSide::South => ((1.0 - t) * w, 0.0),
            WallSide::North => (t * w, h),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub side: WallSide,
    pub geometry: MeshGeometry,
}

/// Builds one wall strip from the terrain profile down to `-depth_range`.
pub fn build_wall(
    side: WallSide,
    space: &MapSpace,
    depth_range: f64,
    elevation: &dyn ElevationSource,
    config: &WallConfig,
) -> Wall {
    let along = config.segments_along.max(1);
    let depth = config.segments_depth.max(1);
    let row = depth + 1;
    let vertex_count = ((along + 1) * row) as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut depth_t = Vec::with_capacity(vertex_count);
    let mut colors = Vec::with_capacity(vertex_count);
    for i in 0..=along {
        let (x, y) = side.point_at(space, i as f64 / along as f64);
        let top_z = elevation.elevation_at(x, y);
        for j in 0..=depth {
            let tz = j as f64 / depth as f64;
            let z = top_z + (-depth_range - top_z) * tz;
            positions.push([x as f32, y as f32, z as f32]);
            depth_t.push(tz as f32);
            colors.push(config.shade(tz as f32));
        }
    }

    let mut indices = Vec::with_capacity((along * depth * 6) as usize);
    for i in 0..along {
        for j in 0..depth {
            let a = i * row + j;
            let b = (i + 1) * row + j;
            let c = (i + 1) * row + j + 1;
            let d = i * row + j + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut geometry = MeshGeometry {
        positions,
        indices,
        depth_t: Some(depth_t),
        colors: Some(colors),
        ..Default::default()
    };
    geometry.compute_vertex_normals();
    Wall { side, geometry }
}

pub fn build_walls(
    space: &MapSpace,
    depth_range: f64,
    elevation: &dyn ElevationSource,
    config: &WallConfig,
) -> Vec<Wall> {
    WallSide::ALL
        .iter()
        .map(|side| build_wall(*side, space, depth_range, elevation, config))
        .collect()
}

/// Outline of the box: the four top terrain profiles, the four flat bottom
/// edges at `-depth_range` and the four vertical corners.
pub fn build_wall_edges(
    space: &MapSpace,
    depth_range: f64,
    elevation: &dyn ElevationSource,
    segments: u32,
) -> Vec<LineGeometry> {
    let segments = segments.max(1);
    let bottom = -depth_range as f32;
    let mut lines = Vec::with_capacity(12);

    for side in WallSide::ALL {
        let profile: Vec<[f32; 3]> = (0..=segments)
            .map(|i| {
                let (x, y) = side.point_at(space, i as f64 / segments as f64);
                [x as f32, y as f32, elevation.elevation_at(x, y) as f32]
            })
            .collect();
        let floor = profile.iter().map(|p| [p[0], p[1], bottom]).collect();
        lines.push(LineGeometry::strip(profile));
        lines.push(LineGeometry::strip(floor));
    }

    let (w, h) = (space.width(), space.height());
    for (x, y) in [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)] {
        let top = elevation.elevation_at(x, y) as f32;
        lines.push(LineGeometry::strip(vec![
            [x as f32, y as f32, top],
            [x as f32, y as f32, bottom],
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::FlatElevation;

    fn config() -> WallConfig {
        WallConfig {
            segments_along: 6,
            segments_depth: 4,
            edge_segments: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_wall_tessellation() {
        let space = MapSpace::default();
        let wall = build_wall(WallSide::West, &space, 350.0, &FlatElevation, &config());
        let mesh = &wall.geometry;
        assert_eq!(mesh.vertex_count(), 7 * 5);
        assert_eq!(mesh.triangle_count(), 6 * 4 * 2);
        assert_eq!(&mesh.indices[..6], &[0, 5, 1, 5, 6, 1]);

        let t = mesh.depth_t.as_ref().unwrap();
        assert_eq!(t[0], 0.0);
        assert_eq!(t[4], 1.0);
        assert_eq!(mesh.positions[4][2], -350.0);
        assert!(mesh.positions.iter().all(|p| p[0] == 0.0));
    }

    #[test]
    fn test_every_wall_faces_outward() {
        let space = MapSpace::default();
        let hilly = |x: f64, y: f64| ((x * 0.01).sin() + (y * 0.02).cos()) * 2.0;
        for wall in build_walls(&space, 400.0, &hilly, &config()) {
            let out = wall.side.outward();
            for face in 0..wall.geometry.triangle_count() {
                let n = wall.geometry.face_normal(face).unwrap();
                let dot = n.x * out[0] + n.y * out[1] + n.z * out[2];
                assert!(dot > 0.0, "{:?} face {} points inward", wall.side, face);
            }
        }
    }

    #[test]
    fn test_top_follows_terrain_and_colors_ramp() {
        let space = MapSpace::default();
        let walls = config();
        let bump = |_x: f64, _y: f64| 1.5;
        let wall = build_wall(WallSide::North, &space, 300.0, &bump, &walls);
        let mesh = &wall.geometry;
        assert_eq!(mesh.positions[0][2], 1.5);
        assert!((mesh.positions[0][1] as f64 - space.height()).abs() < 1e-3);

        let colors = mesh.colors.as_ref().unwrap();
        assert_eq!(colors[0], walls.shade(0.0));
        assert_eq!(colors[4], walls.shade(1.0));
        assert!(colors[0][3] < colors[4][3]);
    }

    #[test]
    fn test_edges() {
        let space = MapSpace::default();
        let edges = build_wall_edges(&space, 350.0, &FlatElevation, 10);
        assert_eq!(edges.len(), 12);
        assert_eq!(edges[0].positions.len(), 11);
        assert!(edges[1].positions.iter().all(|p| p[2] == -350.0));
        let corner = &edges[8];
        assert_eq!(corner.positions, vec![[0.0, 0.0, 0.0], [0.0, 0.0, -350.0]]);
    }
}
