//! Ray generation.
//!
//! Host supplies rays through [`RaySource`], [`PerspectiveCamera`] is the built-in one.

mod perspective_camera;

use crate::common::Ray;

pub use perspective_camera::PerspectiveCamera;

/// Generator of primary rays, one per pixel
pub trait RaySource: Sync {
    /// Ray crossing the view plane at `pixel_coord`.
    ///
    /// Coordinates are in `<0;1>x<0;1>`, point \[0,0\] being the upper left corner.
    fn get_ray(&self, pixel_coord: (f32, f32)) -> Ray;
}
