use nalgebra::{point, vector, Point3, Vector3};

/// Sampled scalar field with values in `<0;1>`.
///
/// Voxel `(x, y, z)` has its center at voxel coordinate `(x, y, z)`,
/// and at texture coordinate `((x + 0.5) / nx, ...)`.
pub trait Volume: Send + Sync {
    // get data dimensions
    fn get_size(&self) -> Vector3<usize>;

    // For building and tests, mostly
    fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32>;

    /// Trilinear sample, `pos` in voxel coordinates.
    /// Positions outside the grid are clamped to the edge voxels.
    fn sample_at(&self, pos: Point3<f32>) -> f32 {
        let size = self.get_size();
        if size.iter().any(|&s| s == 0) {
            return 0.0;
        }

        let (low, high, t) = trilinear_cell(pos, size);

        let fetch = |x: usize, y: usize, z: usize| self.get_data(x, y, z).unwrap_or(0.0);

        let c00 = lerp(fetch(low.x, low.y, low.z), fetch(high.x, low.y, low.z), t.x);
        let c10 = lerp(fetch(low.x, high.y, low.z), fetch(high.x, high.y, low.z), t.x);
        let c01 = lerp(fetch(low.x, low.y, high.z), fetch(high.x, low.y, high.z), t.x);
        let c11 = lerp(fetch(low.x, high.y, high.z), fetch(high.x, high.y, high.z), t.x);

        let c0 = lerp(c00, c10, t.y);
        let c1 = lerp(c01, c11, t.y);

        lerp(c0, c1, t.z)
    }

    /// Trilinear sample at normalized texture coordinates, clamp-to-edge addressing
    fn sample_texture(&self, uvw: Point3<f32>) -> f32 {
        self.sample_at(texture_to_voxel(uvw, self.get_size()))
    }

    /// Sample with gradient, central differences over one voxel.
    /// `pos` in voxel coordinates.
    fn sample_at_gradient(&self, pos: Point3<f32>) -> (f32, Vector3<f32>) {
        // Default implementation, can be replaced with a more effective one for concrete volume types
        let sample = self.sample_at(pos);

        let dx = self.sample_at(pos + Vector3::x()) - self.sample_at(pos - Vector3::x());
        let dy = self.sample_at(pos + Vector3::y()) - self.sample_at(pos - Vector3::y());
        let dz = self.sample_at(pos + Vector3::z()) - self.sample_at(pos - Vector3::z());

        (sample, 0.5 * vector![dx, dy, dz])
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Normalized texture coordinates to voxel coordinates, clamped into the grid
pub fn texture_to_voxel(uvw: Point3<f32>, size: Vector3<usize>) -> Point3<f32> {
    let mut pos = point![0.0, 0.0, 0.0];
    for axis in 0..3 {
        let n = size[axis] as f32;
        let max = (n - 1.0).max(0.0);
        pos[axis] = (uvw[axis].clamp(0.0, 1.0) * n - 0.5).clamp(0.0, max);
    }
    pos
}

/// Lower and upper corner voxel of the interpolation cell around `pos` and the fractional offset.
/// `size` must be non-zero.
pub(crate) fn trilinear_cell(
    pos: Point3<f32>,
    size: Vector3<usize>,
) -> (Point3<usize>, Point3<usize>, Vector3<f32>) {
    let mut low = point![0, 0, 0];
    let mut high = point![0, 0, 0];
    let mut t = vector![0.0, 0.0, 0.0];

    for axis in 0..3 {
        let max = (size[axis] - 1) as f32;
        let p = if pos[axis].is_nan() {
            0.0
        } else {
            pos[axis].clamp(0.0, max)
        };
        let l = p.floor();
        low[axis] = l as usize;
        high[axis] = usize::min(low[axis] + 1, size[axis] - 1);
        t[axis] = p - l;
    }

    (low, high, t)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Volume where value equals `x / (nx - 1)`
    struct Ramp {
        size: Vector3<usize>,
    }

    impl Volume for Ramp {
        fn get_size(&self) -> Vector3<usize> {
            self.size
        }

        fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
            if x < self.size.x && y < self.size.y && z < self.size.z {
                Some(x as f32 / (self.size.x - 1) as f32)
            } else {
                None
            }
        }
    }

    #[test]
    fn texture_mapping() {
        let size = vector![4, 1, 2];

        assert_eq!(
            texture_to_voxel(point![0.125, 0.5, 0.75], size),
            point![0.0, 0.0, 1.0]
        );
        // clamp to edge
        assert_eq!(
            texture_to_voxel(point![-1.0, 0.0, 1.0], size),
            point![0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn trilinear_interpolates() {
        let vol = Ramp {
            size: vector![3, 2, 2],
        };

        assert_eq!(vol.sample_at(point![0.0, 0.0, 0.0]), 0.0);
        assert_eq!(vol.sample_at(point![2.0, 1.0, 1.0]), 1.0);
        assert!((vol.sample_at(point![0.5, 0.3, 0.7]) - 0.25).abs() < 1e-6);
        // clamped
        assert_eq!(vol.sample_at(point![5.0, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn gradient_of_ramp() {
        let vol = Ramp {
            size: vector![5, 3, 3],
        };

        let (sample, grad) = vol.sample_at_gradient(point![2.0, 1.0, 1.0]);

        assert_eq!(sample, 0.5);
        assert!((grad.x - 0.25).abs() < 1e-6);
        assert_eq!(grad.y, 0.0);
        assert_eq!(grad.z, 0.0);
    }
}
