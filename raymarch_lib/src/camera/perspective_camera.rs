use nalgebra::{vector, Point3, Vector2, Vector3};

use crate::common::Ray;

use super::RaySource;

/// Ray-casting camera
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Position of the camera in world coordinates
    position: Point3<f32>,
    /// Direction of camera, unit vector
    direction: Vector3<f32>,
    /// Up direction from the camera's perspective
    up: Vector3<f32>,
    /// Aspect ratio of image plane
    aspect: f32,
    /// Vertical Field of View in degrees
    fov_y: f32,
    /// Size of image plane, calculated from fov_y
    img_plane_size: Vector2<f32>,
    /// Direction of ray passing through pixel \[0,0\], the upper left corner
    dir_00: Vector3<f32>,
    /// Vector offset between two horizontally neighbouring pixels (such as: \[0,0\] -> \[1,0\])
    du: Vector3<f32>,
    /// Vector offset between two vertically neighbouring pixels (such as: \[0,0\] -> \[0,1\])
    dv: Vector3<f32>,
}

impl PerspectiveCamera {
    /// Construct new camera
    ///
    /// # Arguments
    ///
    /// * `position` - Position of the camera in world coordinates
    /// * `direction` - Looking direction of the camera
    ///
    /// # Notes
    ///
    /// The up direction is assumed to be positive y axis,
    /// or positive z axis when looking along y.
    ///
    /// Default fov is 60 degrees, default aspect ratio is 1.
    pub fn new(position: Point3<f32>, direction: Vector3<f32>) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera {
            position,
            direction: direction.normalize(),
            up: vector![0.0, 1.0, 0.0],
            aspect: 1.0,
            fov_y: 60.0,
            img_plane_size: vector![1.0, 1.0],
            dir_00: Vector3::zeros(),
            du: Vector3::zeros(),
            dv: Vector3::zeros(),
        };
        camera.recalc_plane_size();
        camera.recalc_plane();
        camera
    }

    /// Camera at `position`, looking at `target`
    pub fn look_at(position: Point3<f32>, target: Point3<f32>) -> PerspectiveCamera {
        PerspectiveCamera::new(position, target - position)
    }

    /// Changes aspect ratio to match `(width, height)` resolution
    ///
    /// # Example
    ///
    /// ```
    /// use raymarch_lib::camera::PerspectiveCamera;
    /// use nalgebra::{vector, point};
    ///
    /// let mut camera = PerspectiveCamera::new(point![0.0, 0.0, 0.0], vector![1.0, 0.0, 0.0]);
    ///
    /// camera.change_aspect_from_resolution(1280, 720);
    /// // has the same effect as
    /// camera.change_aspect(1280.0 / 720.0);
    /// ```
    pub fn change_aspect_from_resolution(&mut self, width: usize, height: usize) {
        let aspect = (width as f32) / (height as f32);
        self.change_aspect(aspect);
    }

    /// Change vertical FoV of camera
    ///
    /// # Panics
    ///
    /// If `vertical_fov_deg` is not in `(0;180)`
    pub fn change_fov(&mut self, vertical_fov_deg: f32) {
        assert!(vertical_fov_deg > 0.0 && vertical_fov_deg < 180.0);
        self.fov_y = vertical_fov_deg;
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    /// Change aspect ratio of camera
    ///
    /// For example 1.7777 for 16:9 ratio
    pub fn change_aspect(&mut self, aspect_ratio: f32) {
        self.aspect = aspect_ratio;
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    /// Set new position of camera
    pub fn set_pos(&mut self, pos: Point3<f32>) {
        self.position = pos;
    }

    /// Set new direction of camera
    pub fn set_direction(&mut self, direction: Vector3<f32>) {
        self.direction = direction.normalize();
        self.recalc_plane();
    }

    /// Direction getter
    pub fn get_dir(&self) -> Vector3<f32> {
        self.direction
    }

    /// Position getter
    pub fn get_pos(&self) -> Point3<f32> {
        self.position
    }

    // Call when camera direction changed
    fn recalc_plane(&mut self) {
        let mut world_up = vector![0.0, 1.0, 0.0];
        if self.direction.cross(&world_up).magnitude() < 1e-6 {
            world_up = vector![0.0, 0.0, 1.0];
        }
        let right = self.direction.cross(&world_up).normalize();
        self.up = right.cross(&self.direction);
        self.recalc_dudv();
    }

    // Call when fov or aspect ratio changed
    fn recalc_plane_size(&mut self) {
        self.img_plane_size = vector![0.0, 2.0 * f32::tan(f32::to_radians(0.5 * self.fov_y))];
        self.img_plane_size.x = self.img_plane_size.y * self.aspect;
    }

    // Call when direction changed
    fn recalc_dudv(&mut self) {
        self.du = self.img_plane_size.x * self.direction.cross(&self.up).normalize();
        self.dv = -self.img_plane_size.y * self.du.cross(&self.direction).normalize(); // Notice '-' sign
        self.dir_00 = self.direction - 0.5 * self.du - 0.5 * self.dv;
    }
}

impl RaySource for PerspectiveCamera {
    fn get_ray(&self, pixel_coord: (f32, f32)) -> Ray {
        let dir = self.dir_00 + self.du * pixel_coord.0 + self.dv * pixel_coord.1;
        Ray::from_unnormalized(self.position, dir)
    }
}
