use nalgebra::{Point3, Vector3};

use crate::error::AssemblyError;

use super::{volume::trilinear_cell, Volume, VolumeMetadata};

/// Normalized voxels in one contiguous buffer.
///
/// Layout is `x + y * nx + z * nx * ny`, every slice is a contiguous run of `nx * ny` values.
#[derive(Clone, PartialEq)]
pub struct PackedVolume {
    metadata: VolumeMetadata,
    data: Vec<f32>,
}

impl std::fmt::Debug for PackedVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedVolume")
            .field("metadata", &self.metadata)
            .field("data len", &self.data.len())
            .finish()
    }
}

impl PackedVolume {
    pub fn new(metadata: VolumeMetadata, data: Vec<f32>) -> Result<PackedVolume, AssemblyError> {
        let expected = metadata.voxel_count();
        if data.len() != expected {
            return Err(AssemblyError::InconsistentStack(format!(
                "volume {:?} needs {expected} voxels, got {}",
                metadata.dims,
                data.len()
            )));
        }
        Ok(PackedVolume { metadata, data })
    }

    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    pub fn dims(&self) -> Vector3<usize> {
        self.metadata.dims
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let dims = self.metadata.dims;
        x + y * dims.x + z * dims.x * dims.y
    }

    /// Voxels of slice `z`
    pub fn slice(&self, z: usize) -> Option<&[f32]> {
        let len = self.metadata.dims.x * self.metadata.dims.y;
        self.data.get(z * len..(z + 1) * len)
    }

    /// Copy of a sub-volume, in the same layout.
    /// `None` if the region reaches outside the volume.
    pub fn region(&self, offset: Vector3<usize>, size: Vector3<usize>) -> Option<Vec<f32>> {
        let dims = self.metadata.dims;
        let fits = (0..3).all(|i| offset[i] + size[i] <= dims[i]);
        if !fits {
            return None;
        }

        let mut out = Vec::with_capacity(size.x * size.y * size.z);
        for z in offset.z..offset.z + size.z {
            for y in offset.y..offset.y + size.y {
                let start = self.index(offset.x, y, z);
                out.extend_from_slice(&self.data[start..start + size.x]);
            }
        }
        Some(out)
    }
}

impl Volume for PackedVolume {
    fn get_size(&self) -> Vector3<usize> {
        self.metadata.dims
    }

    fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        let dims = self.metadata.dims;
        if x >= dims.x || y >= dims.y || z >= dims.z {
            return None;
        }
        self.data.get(self.index(x, y, z)).copied()
    }

    fn sample_at(&self, pos: Point3<f32>) -> f32 {
        let (low, high, t) = trilinear_cell(pos, self.metadata.dims);

        let row = self.metadata.dims.x;
        let plane = row * self.metadata.dims.y;

        let base_low = low.z * plane;
        let base_high = high.z * plane;

        // c[y][z] interpolated over x
        let along_x = |y: usize, z_base: usize| {
            let start = z_base + y * row;
            let a = self.data[start + low.x];
            let b = self.data[start + high.x];
            a + (b - a) * t.x
        };

        let c00 = along_x(low.y, base_low);
        let c10 = along_x(high.y, base_low);
        let c01 = along_x(low.y, base_high);
        let c11 = along_x(high.y, base_high);

        let c0 = c00 + (c10 - c00) * t.y;
        let c1 = c01 + (c11 - c01) * t.y;

        c0 + (c1 - c0) * t.z
    }
}

#[cfg(test)]
mod test {
    use nalgebra::{point, vector};

    use super::*;
    use crate::common::ValueRange;

    fn volume(dims: Vector3<usize>) -> PackedVolume {
        let meta = VolumeMetadata::new(dims, vector![1.0, 1.0, 1.0], ValueRange::unit()).unwrap();
        let count = meta.voxel_count();
        let data = (0..count).map(|i| i as f32 / (count - 1) as f32).collect();
        PackedVolume::new(meta, data).unwrap()
    }

    #[test]
    fn length_checked() {
        let meta =
            VolumeMetadata::new(vector![2, 2, 2], vector![1.0, 1.0, 1.0], ValueRange::unit())
                .unwrap();

        assert!(PackedVolume::new(meta, vec![0.0; 7]).is_err());
        assert!(PackedVolume::new(meta, vec![0.0; 8]).is_ok());
    }

    #[test]
    fn layout_slices_contiguous() {
        let vol = volume(vector![3, 2, 4]);

        assert_eq!(vol.index(1, 1, 2), 1 + 3 + 12);
        assert_eq!(vol.slice(1).unwrap().len(), 6);
        assert_eq!(vol.slice(1).unwrap()[0], vol.get_data(0, 0, 1).unwrap());
        assert!(vol.slice(4).is_none());
        assert_eq!(vol.get_data(3, 0, 0), None);
    }

    #[test]
    fn region_copy() {
        let vol = volume(vector![3, 3, 3]);

        let region = vol.region(vector![1, 1, 1], vector![2, 1, 2]).unwrap();

        assert_eq!(
            region,
            vec![
                vol.get_data(1, 1, 1).unwrap(),
                vol.get_data(2, 1, 1).unwrap(),
                vol.get_data(1, 1, 2).unwrap(),
                vol.get_data(2, 1, 2).unwrap(),
            ]
        );
        assert!(vol.region(vector![2, 0, 0], vector![2, 1, 1]).is_none());
    }

    /// Specialized sampling agrees with the generic one
    #[test]
    fn sample_matches_default() {
        struct Generic<'a>(&'a PackedVolume);
        impl Volume for Generic<'_> {
            fn get_size(&self) -> Vector3<usize> {
                self.0.get_size()
            }
            fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
                self.0.get_data(x, y, z)
            }
        }

        let vol = volume(vector![4, 3, 5]);
        let generic = Generic(&vol);

        let spots = [
            point![0.0, 0.0, 0.0],
            point![1.3, 0.7, 2.2],
            point![3.0, 2.0, 4.0],
            point![2.9, 1.5, 0.1],
            point![-1.0, 5.0, 2.5],
        ];
        for spot in spots {
            let dif = (vol.sample_at(spot) - generic.sample_at(spot)).abs();
            assert!(dif < 1e-6, "at {spot:?}");
        }
    }
}
