use nalgebra::Vector3;

/// Indexed triangle mesh in map space (x east, y north, z up, kilometres)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Per-vertex interpolation parameter (walls: 0 at the top, 1 at the bottom)
    pub depth_t: Option<Vec<f32>>,
    /// Baked sRGB-encoded RGBA per vertex
    pub colors: Option<Vec<[f32; 4]>>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Area-weighted vertex normals from the indexed faces.
    ///
    /// Each face contributes `(c - b) x (a - b)` to its three vertices.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vector3::<f32>::zeros(); self.positions.len()];
        for [ia, ib, ic] in self.triangles() {
            let (ia, ib, ic) = (ia as usize, ib as usize, ic as usize);
            let a = Vector3::from(self.positions[ia]);
            let b = Vector3::from(self.positions[ib]);
            let c = Vector3::from(self.positions[ic]);
            let face = (c - b).cross(&(a - b));
            accum[ia] += face;
            accum[ib] += face;
            accum[ic] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| {
                let len = n.norm();
                if len > f32::EPSILON {
                    (n / len).into()
                } else {
                    [0.0, 0.0, 0.0]
                }
            })
            .collect();
    }

    /// Unit normal of face `index`
    pub fn face_normal(&self, index: usize) -> Option<Vector3<f32>> {
        let tri = self.indices.get(index * 3..index * 3 + 3)?;
        let a = Vector3::from(*self.positions.get(tri[0] as usize)?);
        let b = Vector3::from(*self.positions.get(tri[1] as usize)?);
        let c = Vector3::from(*self.positions.get(tri[2] as usize)?);
        (c - b).cross(&(a - b)).try_normalize(f32::EPSILON)
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn color_bytes(&self) -> Option<&[u8]> {
        self.colors.as_deref().map(bytemuck::cast_slice)
    }

    /// Axis-aligned bounds as `(min, max)`; `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        bounding_box(&self.positions)
    }
}

/// How consecutive positions of a [`LineGeometry`] form segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTopology {
    /// Connected polyline through every position
    Strip,
    /// Independent pairs of positions
    Segments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    pub topology: LineTopology,
    pub positions: Vec<[f32; 3]>,
}

impl LineGeometry {
    pub fn strip(positions: Vec<[f32; 3]>) -> Self {
        Self {
            topology: LineTopology::Strip,
            positions,
        }
    }

    pub fn segments(positions: Vec<[f32; 3]>) -> Self {
        Self {
            topology: LineTopology::Segments,
            positions,
        }
    }

    pub fn segment_count(&self) -> usize {
        match self.topology {
            LineTopology::Strip => self.positions.len().saturating_sub(1),
            LineTopology::Segments => self.positions.len() / 2,
        }
    }

    /// Every segment as an endpoint pair, whatever the topology
    pub fn segment_pairs(&self) -> Vec<([f32; 3], [f32; 3])> {
        match self.topology {
            LineTopology::Strip => self.positions.windows(2).map(|w| (w[0], w[1])).collect(),
            LineTopology::Segments => self
                .positions
                .chunks_exact(2)
                .map(|p| (p[0], p[1]))
                .collect(),
        }
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        bounding_box(&self.positions)
    }
}

fn bounding_box(positions: &[[f32; 3]]) -> Option<([f32; 3], [f32; 3])> {
    let first = *positions.first()?;
    Some(positions.iter().fold((first, first), |(mut lo, mut hi), p| {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(p[axis]);
            hi[axis] = hi[axis].max(p[axis]);
        }
        (lo, hi)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshGeometry {
        MeshGeometry {
            positions: vec![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            indices: vec![0, 1, 3, 1, 2, 3],
            ..Default::default()
        }
    }

    #[test]
    fn test_vertex_normals_face_up() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
        assert!(mesh.face_normal(1).unwrap().z > 0.99);
        assert!(mesh.face_normal(2).is_none());
    }

    #[test]
    fn test_byte_views() {
        let mesh = quad();
        assert_eq!(mesh.position_bytes().len(), 4 * 3 * 4);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
        assert!(mesh.color_bytes().is_none());
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_line_topologies() {
        let pts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, -2.0]];
        let strip = LineGeometry::strip(pts.clone());
        let segs = LineGeometry::segments(pts);
        assert_eq!(strip.segment_count(), 3);
        assert_eq!(segs.segment_count(), 2);
        assert_eq!(strip.segment_pairs()[1], ([1.0, 0.0, 0.0], [1.0, 1.0, 0.0]));
        let (lo, hi) = segs.bounding_box().unwrap();
        assert_eq!(lo, [0.0, 0.0, -2.0]);
        assert_eq!(hi, [1.0, 1.0, 0.0]);
    }
}
