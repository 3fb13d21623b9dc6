//! Volume data: metadata, packed voxel buffer and its assembly from slices.

mod assembler;
mod metadata;
mod packed_volume;
mod range_index;
mod volume;

pub use assembler::{
    AssemblyOptions, Normalization, VolumeAssembler, DEFAULT_Z_SPACING, MAX_SPAN_PER_SLICE,
};
pub use metadata::{CoordinateConvention, VolumeMetadata};
pub use packed_volume::PackedVolume;
pub use range_index::{RangeIndex, DEFAULT_BLOCK_SIDE};
pub use volume::{texture_to_voxel, Volume};
