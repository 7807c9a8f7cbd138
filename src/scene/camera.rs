use crate::core::config::CameraConfig;
use crate::core::geo::MapSpace;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Half-line used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Perspective camera over map space with `+z` up
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    position: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// Point an orbit controller should circle
    orbit_target: Point3<f32>,
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
    view_projection_matrix: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            target,
            up: Vector3::z(),
            fov_degrees,
            aspect,
            near,
            far,
            orbit_target: target,
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
            view_projection_matrix: Matrix4::identity(),
        };
        camera.update_matrices();
        camera
    }

    /// Initial viewpoint: south of the map, raised above it, aimed at its centre
    pub fn for_map(space: &MapSpace, config: &CameraConfig) -> Self {
        let (w, h) = (space.width() as f32, space.height() as f32);
        let position = Point3::new(w * 0.5, -h * 0.8, w.max(h) * 1.2);
        let target = Point3::new(w * 0.5, h * 0.5, 0.0);
        let mut camera = Self::new(
            position,
            target,
            config.fov_degrees,
            config.aspect,
            config.near,
            config.far,
        );
        camera.orbit_target = Point3::new(w * 0.5, h * 0.5, -config.target_depth_km as f32);
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn orbit_target(&self) -> Point3<f32> {
        self.orbit_target
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        if self.position != position {
            self.position = position;
            self.update_matrices();
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        if self.target != target {
            self.target = target;
            self.update_matrices();
        }
    }

    /// Update after a viewport resize
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 && (self.aspect - aspect).abs() > f32::EPSILON {
            self.aspect = aspect;
            self.update_matrices();
        }
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection_matrix
    }

    pub fn view_projection_matrix(&self) -> &Matrix4<f32> {
        &self.view_projection_matrix
    }

    /// Column-major view-projection for GPU upload
    pub fn view_projection_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.view_projection_matrix.as_slice());
        out
    }

    /// World point to normalised device coordinates; `None` behind the camera
    pub fn project(&self, world: &Point3<f32>) -> Option<Point3<f32>> {
        let clip = self.view_projection_matrix * Vector4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
    }

    /// Ray from the eye through NDC `(x, y)`, both in `[-1, 1]`.
    ///
    /// Unprojects the near and far plane points in f64; f32 loses the
    /// direction when the eye sits far from a close near plane.
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let position = self.position.cast::<f64>();
        let target = self.target.cast::<f64>();
        let projection = Matrix4::<f64>::new_perspective(
            self.aspect as f64,
            (self.fov_degrees as f64).to_radians(),
            self.near as f64,
            self.far as f64,
        );
        let view = Matrix4::look_at_rh(&position, &target, &self.up.cast::<f64>());
        let inverse = (projection * view).try_inverse()?;

        let unproject = |ndc_z: f64| -> Option<Point3<f64>> {
            let world = inverse * Vector4::new(ndc_x as f64, ndc_y as f64, ndc_z, 1.0);
            if world.w.abs() < f64::EPSILON {
                return None;
            }
            Some(Point3::new(world.x / world.w, world.y / world.w, world.z / world.w))
        };
        let near = unproject(-1.0)?;
        let far = unproject(1.0)?;
        let direction = (far - near).try_normalize(f64::EPSILON)?;
        Some(Ray {
            origin: self.position,
            direction: direction.cast::<f32>(),
        })
    }

    fn update_matrices(&mut self) {
        self.projection_matrix = Matrix4::new_perspective(
            self.aspect,
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
        );
        self.view_matrix = Matrix4::look_at_rh(&self.position, &self.target, &self.up);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }
}
