//! Terrain surface: a regular plane over map space displaced by elevation.

use super::geometry::MeshGeometry;
use crate::core::geo::MapSpace;
use crate::elevation::ElevationSource;

/// Builds the displaced terrain plane with `segments` cells per axis.
///
/// Vertex rows run from the north edge (`y = height`) southwards and columns
/// from west to east, so vertex `ix + (segments + 1) * iy` sits at
/// `(ix * width / segments, height - iy * height / segments)`. UVs map the
/// north-west corner to `(0, 1)`, matching a raster stored top row first.
pub fn build_terrain(space: &MapSpace, segments: u32, elevation: &dyn ElevationSource) -> MeshGeometry {
    let segments = segments.max(1);
    let grid = segments + 1;
    let (width, height) = (space.width(), space.height());
    let vertex_count = (grid * grid) as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    for iy in 0..grid {
        let v = iy as f64 / segments as f64;
        let y = height - v * height;
        for ix in 0..grid {
            let u = ix as f64 / segments as f64;
            let x = u * width;
            let z = elevation.elevation_at(x, y);
            positions.push([x as f32, y as f32, z as f32]);
            uvs.push([u as f32, (1.0 - v) as f32]);
        }
    }

    let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
    for iy in 0..segments {
        for ix in 0..segments {
            let a = ix + grid * iy;
            let b = ix + grid * (iy + 1);
            let c = (ix + 1) + grid * (iy + 1);
            let d = (ix + 1) + grid * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut mesh = MeshGeometry {
        positions,
        uvs,
        indices,
        ..Default::default()
    };
    mesh.compute_vertex_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::FlatElevation;

    #[test]
    fn test_flat_plane_layout() {
        let space = MapSpace::default();
        let mesh = build_terrain(&space, 4, &FlatElevation);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);

        let nw = mesh.positions[0];
        assert_eq!(nw[0], 0.0);
        assert!((nw[1] as f64 - space.height()).abs() < 1e-3);
        assert_eq!(mesh.uvs[0], [0.0, 1.0]);
        let se = mesh.positions[24];
        assert!((se[0] as f64 - space.width()).abs() < 1e-3);
        assert!(se[1].abs() < 1e-3);
        assert_eq!(mesh.uvs[24], [1.0, 0.0]);

        assert!(mesh.positions.iter().all(|p| p[2] == 0.0));
        assert!(mesh.normals.iter().all(|n| (n[2] - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_displacement_tilts_normals() {
        let space = MapSpace::default();
        // Rises to the east.
        let ramp = |x: f64, _y: f64| x * 0.1;
        let mesh = build_terrain(&space, 8, &ramp);
        let last = mesh.positions[8];
        assert!((last[2] as f64 - space.width() * 0.1).abs() < 1e-2);
        for n in &mesh.normals {
            assert!(n[0] < 0.0);
            assert!(n[2] > 0.0);
        }
    }
}
