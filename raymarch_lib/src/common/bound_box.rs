use nalgebra::{point, Isometry3, Point3, UnitQuaternion, Vector3};

use super::Ray;

/// Direction components smaller than this are treated as parallel to a slab
const PARALLEL_EPSILON: f32 = 1e-8;

/// Box with arbitrary orientation in world space.
///
/// Volumes are placed in the world as oriented boxes. Local space has the box
/// centered at origin, with axes aligned to the box edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Point3<f32>,
    pub half_extents: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl OrientedBox {
    pub fn new(
        center: Point3<f32>,
        half_extents: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> OrientedBox {
        OrientedBox {
            center,
            half_extents,
            orientation,
        }
    }

    /// Axis aligned box spanning `lower` to `upper`
    pub fn axis_aligned(lower: Point3<f32>, upper: Point3<f32>) -> OrientedBox {
        let half_extents = 0.5 * (upper - lower);
        OrientedBox {
            center: lower + half_extents,
            half_extents,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Unit cube centered at origin
    ///
    /// For testing purposes
    pub fn unit() -> OrientedBox {
        OrientedBox::axis_aligned(point![-0.5, -0.5, -0.5], point![0.5, 0.5, 0.5])
    }

    /// Place the box with a rigid transformation (applied after the current placement)
    pub fn transformed(&self, transform: &Isometry3<f32>) -> OrientedBox {
        OrientedBox {
            center: transform * self.center,
            half_extents: self.half_extents,
            orientation: transform.rotation * self.orientation,
        }
    }

    /// Edge lengths
    pub fn dims(&self) -> Vector3<f32> {
        2.0 * self.half_extents
    }

    /// World point into box-local space
    pub fn to_local_point(&self, pos: &Point3<f32>) -> Point3<f32> {
        Point3::from(self.orientation.inverse_transform_vector(&(pos - self.center)))
    }

    /// World vector into box-local space
    pub fn to_local_vector(&self, vec: &Vector3<f32>) -> Vector3<f32> {
        self.orientation.inverse_transform_vector(vec)
    }

    /// World point into normalized texture coordinates.
    /// Points inside the box map into `<0;1>^3`, nothing gets clamped here.
    pub fn to_texture(&self, pos: &Point3<f32>) -> Point3<f32> {
        let local = self.to_local_point(pos);
        let shifted = local.coords + self.half_extents;
        Point3::from(shifted.component_div(&self.dims()))
    }

    pub fn contains(&self, pos: &Point3<f32>) -> bool {
        let local = self.to_local_point(pos);
        local
            .coords
            .iter()
            .zip(self.half_extents.iter())
            .all(|(&p, &h)| p >= -h && p <= h)
    }

    /// Ray-box intersection, slab method in box-local space.
    ///
    /// Returns `(t_near, t_far)` with `0 <= t_near <= t_far`, or `None` if the ray misses
    /// the box or the box is behind the ray origin.
    /// `t_near` is clamped to zero when the ray starts inside the box.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        let origin = self.to_local_point(&ray.origin);
        let direction = self.to_local_vector(&ray.direction);

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let half = self.half_extents[axis];
            let o = origin[axis];
            let d = direction[axis];

            if d.abs() < PARALLEL_EPSILON {
                // Parallel with this slab pair, ray is either always between the planes or never
                if o < -half || o > half {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let t0 = (-half - o) * inv;
            let t1 = (half - o) * inv;
            let (t0, t1) = if t0 < t1 { (t0, t1) } else { (t1, t0) };

            t_near = f32::max(t_near, t0);
            t_far = f32::min(t_far, t1);
        }

        // zero direction
        if !t_far.is_finite() {
            return None;
        }

        // if t_far < 0, the whole box is behind us
        if t_far.is_sign_negative() {
            return None;
        }

        // if t_near > t_far, ray doesn't intersect box
        if t_near > t_far {
            return None;
        }

        Some((f32::max(t_near, 0.0), t_far))
    }
}
