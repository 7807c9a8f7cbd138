//! Reference lattice under the map: graticule lines repeated at depth steps.

use super::geometry::LineGeometry;
use crate::core::geo::{MapPoint, MapSpace};

/// Graticule samples along one axis: the lower bound, every whole multiple
/// of `step` inside the range, then the upper bound. Coincident values
/// appear once.
pub fn axis_samples(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut samples = vec![min];
    if step > 0.0 {
        let mut value = (min / step).ceil() * step;
        let end = (max / step).floor() * step;
        while value <= end + 1e-9 {
            samples.push(value);
            value += step;
        }
    }
    samples.push(max);
    samples.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    samples
}

/// Spacing between depth levels: the map distance of one `degree_step` of
/// longitude, so lattice cells are roughly cubic.
pub fn depth_step(space: &MapSpace, degree_step: f64) -> f64 {
    space.longitude_step(degree_step)
}

/// Builds the lattice as independent segments.
///
/// Three families: a vertical line at every graticule intersection from
/// the surface to `-depth_max`, then at every depth level a line to the
/// northern neighbour and a line to the eastern neighbour.
pub fn build_grid(space: &MapSpace, depth_max: f64, degree_step: f64) -> LineGeometry {
    let bounds = space.bounds();
    let lon_samples = axis_samples(bounds.lon_min, bounds.lon_max, degree_step);
    let lat_samples = axis_samples(bounds.lat_min, bounds.lat_max, degree_step);
    let lon_count = lon_samples.len();

    let z_step = depth_step(space, degree_step);
    let depth_lines = if z_step > 0.0 {
        ((depth_max / z_step).ceil() as usize).max(1) + 1
    } else {
        2
    };
    let depths: Vec<f32> = (0..depth_lines)
        .map(|d| -(depth_max.min(d as f64 * z_step)) as f32)
        .collect();

    let verts: Vec<MapPoint> = lat_samples
        .iter()
        .flat_map(|lat| lon_samples.iter().map(move |lon| (*lon, *lat)))
        .map(|(lon, lat)| space.lon_lat_to_map_xy(lon, lat))
        .collect();

    let bottom = -depth_max as f32;
    let mut positions = Vec::new();
    for p in &verts {
        let (x, y) = (p.x as f32, p.y as f32);
        positions.push([x, y, 0.0]);
        positions.push([x, y, bottom]);
    }

    let mut push_level_lines = |from: &MapPoint, to: &MapPoint| {
        for z in &depths {
            positions.push([from.x as f32, from.y as f32, *z]);
            positions.push([to.x as f32, to.y as f32, *z]);
        }
    };
    for (i, p) in verts.iter().enumerate() {
        if let Some(next) = verts.get(i + lon_count) {
            push_level_lines(p, next);
        }
    }
    for (i, p) in verts.iter().enumerate() {
        if (i + 1) % lon_count != 0 {
            push_level_lines(p, &verts[i + 1]);
        }
    }

    LineGeometry::segments(positions)
}
