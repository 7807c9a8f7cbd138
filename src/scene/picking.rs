//! Pointer picking against the marker instances and the tooltip it drives.

use super::camera::{PerspectiveCamera, Ray};
use crate::core::constants::TOOLTIP_OFFSET;
use crate::data::earthquake::Earthquake;
use crate::mesh::points::MarkerInstance;
use nalgebra::{Point3, Vector3};

/// On-screen rectangle of the drawing surface, in client pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Client pixel to normalised device coordinates, y up
    pub fn to_ndc(&self, client_x: f64, client_y: f64) -> (f32, f32) {
        let x = (client_x - self.left) / self.width * 2.0 - 1.0;
        let y = -((client_y - self.top) / self.height) * 2.0 + 1.0;
        (x as f32, y as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub index: usize,
    /// Distance along the world-space ray
    pub distance: f32,
}

/// Nearest entry of the ray into a sphere, or the exit if the origin is inside.
///
/// `direction` need not be unit length; the result is in units of it.
fn ray_sphere(origin: &Point3<f32>, direction: &Vector3<f32>, center: &Point3<f32>, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = direction.dot(direction);
    if a <= f32::EPSILON {
        return None;
    }
    let half_b = oc.dot(direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = (-half_b - root) / a;
    if near >= 0.0 {
        return Some(near);
    }
    let far = (-half_b + root) / a;
    (far >= 0.0).then_some(far)
}

/// Intersects `ray` with every marker, where markers live in a group scaled
/// per axis by `world_scale`. Nearest hit wins.
pub fn pick_instance(ray: &Ray, instances: &[MarkerInstance], world_scale: [f32; 3]) -> Option<PickHit> {
    let inv = Vector3::new(1.0 / world_scale[0], 1.0 / world_scale[1], 1.0 / world_scale[2]);
    let origin = Point3::from(ray.origin.coords.component_mul(&inv));
    let direction = ray.direction.component_mul(&inv);

    instances
        .iter()
        .enumerate()
        .filter_map(|(index, marker)| {
            let [x, y, z] = marker.position;
            let center = Point3::new(x, y, z);
            ray_sphere(&origin, &direction, &center, marker.scale.abs())
                .map(|distance| PickHit { index, distance })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Visible tooltip state; absence means hidden
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub index: usize,
    pub text: String,
    pub left: f64,
    pub top: f64,
}

pub fn tooltip_text(event: &Earthquake) -> String {
    format!(
        "Lat: {:.3}\nLon: {:.3}\nDepth: {:.1} km\nMagnitude: {:.1}\nTime: {}",
        event.lat, event.lon, event.depth, event.amplitude, event.time
    )
}

/// Full pointer-move handling: NDC, ray, hit test, tooltip
pub fn pick_tooltip(
    camera: &PerspectiveCamera,
    rect: &ViewportRect,
    client_x: f64,
    client_y: f64,
    instances: &[MarkerInstance],
    events: &[Earthquake],
    world_scale: [f32; 3],
) -> Option<Tooltip> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let (ndc_x, ndc_y) = rect.to_ndc(client_x, client_y);
    let ray = camera.ray_from_ndc(ndc_x, ndc_y)?;
    let hit = pick_instance(&ray, instances, world_scale)?;
    let event = events.get(hit.index)?;
    Some(Tooltip {
        index: hit.index,
        text: tooltip_text(event),
        left: client_x + TOOLTIP_OFFSET,
        top: client_y + TOOLTIP_OFFSET,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(x: f32, y: f32, z: f32, scale: f32) -> MarkerInstance {
        MarkerInstance {
            position: [x, y, z],
            scale,
            color: [1.0, 0.0, 0.0],
        }
    }

    fn down_ray(x: f32, y: f32) -> Ray {
        Ray {
            origin: Point3::new(x, y, 100.0),
            direction: -Vector3::z(),
        }
    }

    #[test]
    fn test_ndc_corners() {
        let rect = ViewportRect::new(10.0, 20.0, 200.0, 100.0);
        assert_eq!(rect.to_ndc(10.0, 20.0), (-1.0, 1.0));
        assert_eq!(rect.to_ndc(210.0, 120.0), (1.0, -1.0));
        assert_eq!(rect.to_ndc(110.0, 70.0), (0.0, 0.0));
    }

    #[test]
    fn test_nearest_hit_wins() {
        let markers = [marker(0.0, 0.0, -50.0, 2.0), marker(0.0, 0.0, -10.0, 2.0), marker(30.0, 0.0, 0.0, 2.0)];
        let hit = pick_instance(&down_ray(0.0, 0.0), &markers, [1.0; 3]).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.distance - 108.0).abs() < 1e-4);
        assert!(pick_instance(&down_ray(10.0, 10.0), &markers, [1.0; 3]).is_none());
    }

    #[test]
    fn test_world_scale_moves_markers() {
        let markers = [marker(10.0, 0.0, 0.0, 1.0)];
        assert!(pick_instance(&down_ray(10.0, 0.0), &markers, [1.0; 3]).is_some());
        assert!(pick_instance(&down_ray(10.0, 0.0), &markers, [2.0, 1.0, 1.0]).is_none());
        assert!(pick_instance(&down_ray(20.0, 0.0), &markers, [2.0, 1.0, 1.0]).is_some());
    }

    #[test]
    fn test_tooltip_format() {
        let event = Earthquake {
            lat: 23.5,
            lon: 121.0,
            depth: 10.04,
            amplitude: 5.42,
            time: "2024-04-02T23:58:09Z".to_string(),
            event_id: None,
        };
        assert_eq!(
            tooltip_text(&event),
            "Lat: 23.500\nLon: 121.000\nDepth: 10.0 km\nMagnitude: 5.4\nTime: 2024-04-02T23:58:09Z"
        );
    }
}
