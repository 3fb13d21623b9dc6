use nalgebra::{vector, Point3, Vector3};
use rayon::prelude::*;

use crate::common::ValueRange;

use super::Volume;

/// Default side of an index block, in voxel cells
pub const DEFAULT_BLOCK_SIDE: usize = 8;

/// Minimum and maximum sample of every block of the volume.
///
/// Block `b` covers interpolation cells `b * side .. (b + 1) * side`, so it holds
/// voxels `b * side ..= (b + 1) * side`. Neighbouring blocks share their border voxels,
/// the last voxel along an axis belongs to the last block.
/// Any trilinear sample taken inside a block lies in the block's range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeIndex {
    block_side: usize,
    /// Volume dimensions
    dims: Vector3<usize>,
    /// Number of blocks along each axis
    size: Vector3<usize>,
    ranges: Vec<ValueRange>,
}

impl RangeIndex {
    pub fn from_volume<V>(volume: &V, block_side: usize) -> RangeIndex
    where
        V: Volume + ?Sized,
    {
        let block_side = block_side.max(1);
        let dims = volume.get_size();
        if dims.iter().any(|&d| d == 0) {
            return RangeIndex {
                block_side,
                dims,
                size: Vector3::zeros(),
                ranges: Vec::new(),
            };
        }

        let size = dims.map(|d| usize::max(1, (d - 1 + block_side - 1) / block_side));
        let ranges = (0..size.product())
            .into_par_iter()
            .map(|i| {
                let block = vector![i % size.x, (i / size.x) % size.y, i / (size.x * size.y)];
                block_range(volume, &dims, &block, block_side)
            })
            .collect();

        RangeIndex {
            block_side,
            dims,
            size,
            ranges,
        }
    }

    pub fn block_side(&self) -> usize {
        self.block_side
    }

    /// Number of blocks along each axis
    pub fn size(&self) -> Vector3<usize> {
        self.size
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[ValueRange] {
        &self.ranges
    }

    /// Block containing voxel coordinate `pos`, `None` outside the index
    pub fn block_at(&self, pos: &Point3<f32>) -> Option<usize> {
        let mut block = [0; 3];
        for axis in 0..3 {
            let p = pos[axis];
            if self.size[axis] == 0 || !(p >= 0.0 && p <= (self.dims[axis] - 1) as f32) {
                return None;
            }
            block[axis] = usize::min(p as usize / self.block_side, self.size[axis] - 1);
        }
        Some(block[0] + block[1] * self.size.x + block[2] * self.size.x * self.size.y)
    }

    pub fn range_at(&self, pos: &Point3<f32>) -> Option<ValueRange> {
        self.block_at(pos).map(|i| self.ranges[i])
    }
}

fn block_range<V>(volume: &V, dims: &Vector3<usize>, block: &Vector3<usize>, side: usize) -> ValueRange
where
    V: Volume + ?Sized,
{
    let low = block.map(|b| b * side);
    let high = vector![
        usize::min(low.x + side, dims.x - 1),
        usize::min(low.y + side, dims.y - 1),
        usize::min(low.z + side, dims.z - 1)
    ];

    let mut range = ValueRange::empty();
    for z in low.z..=high.z {
        for y in low.y..=high.y {
            for x in low.x..=high.x {
                if let Some(v) = volume.get_data(x, y, z) {
                    range.extend(v);
                }
            }
        }
    }
    range
}
