use nalgebra::{Isometry3, Vector3};

use crate::{
    common::OrientedBox,
    volumetric::{RangeIndex, VolumeMetadata, DEFAULT_BLOCK_SIDE},
};

use super::MemoryTexture;

/// Uploaded volume, ready for rendering.
///
/// This is what gets published to renderers.
/// Block value ranges of the texels are indexed on creation, for empty space skipping.
#[derive(Debug, Clone)]
pub struct VolumeTexture {
    pub texture: MemoryTexture,
    pub metadata: VolumeMetadata,
    /// Placement of the volume box in the world, applied after metadata origin
    pub transform: Isometry3<f32>,
    range_index: RangeIndex,
}

impl VolumeTexture {
    pub fn new(texture: MemoryTexture, metadata: VolumeMetadata) -> VolumeTexture {
        let range_index = RangeIndex::from_volume(&texture, DEFAULT_BLOCK_SIDE);
        VolumeTexture {
            texture,
            metadata,
            transform: Isometry3::identity(),
            range_index,
        }
    }

    pub fn with_transform(mut self, transform: Isometry3<f32>) -> VolumeTexture {
        self.transform = transform;
        self
    }

    /// World space box of the volume
    pub fn bounding_box(&self) -> OrientedBox {
        self.metadata.bounding_box().transformed(&self.transform)
    }

    pub fn spacing(&self) -> Vector3<f32> {
        self.metadata.spacing
    }

    pub fn range_index(&self) -> &RangeIndex {
        &self.range_index
    }
}
