//! Module with helper functions
//! Saves repetition in unit tests, integration tests and benchmarks

use nalgebra::{vector, Vector3};

use crate::{
    color::{self, RGBA},
    common::ValueRange,
    slice::{EncodedSlice, RawLayout, SampleFormat, SliceDecoder},
    texture::{TextureFormat, UploadOptions, VolumeTexture, VolumeTextureWriter, MemoryTexture},
    volumetric::{PackedVolume, VolumeMetadata},
};

/// Opacity grows with the sample, white color
pub fn white_tf(sample: f32) -> RGBA {
    color::mono(1.0, sample)
}

/// Fully opaque white wherever sample is non-zero
pub fn opaque_tf(sample: f32) -> RGBA {
    if sample > 0.0 {
        color::mono(1.0, 1.0)
    } else {
        color::zero()
    }
}

/// Decoder reading raw `u8` slices of given size
pub fn raw_u8_decoder(width: usize, height: usize) -> SliceDecoder {
    SliceDecoder::with_raw_layout(RawLayout::new(width, height, SampleFormat::U8))
}

/// Raw `u8` slice filled with one value
pub fn uniform_slice(width: usize, height: usize, value: u8, index: i32) -> EncodedSlice {
    EncodedSlice::new(vec![value; width * height], "raw", index)
}

/// `count` raw `u8` slices of one value, indices `0..count`
pub fn uniform_stack(count: usize, width: usize, height: usize, value: u8) -> Vec<EncodedSlice> {
    (0..count)
        .map(|i| uniform_slice(width, height, value, i as i32))
        .collect()
}

/// Raw `u8` slices, slice `i` holds value `i * step` everywhere
pub fn ramp_stack(count: usize, width: usize, height: usize, step: u8) -> Vec<EncodedSlice> {
    (0..count)
        .map(|i| uniform_slice(width, height, (i as u8).wrapping_mul(step), i as i32))
        .collect()
}

/// Full range of `u8` samples
pub fn u8_range() -> ValueRange {
    ValueRange::new(0.0, 255.0)
}

/// Volume of one normalized value, unit voxels
pub fn constant_volume(dims: Vector3<usize>, value: f32) -> PackedVolume {
    let meta = VolumeMetadata::new(dims, vector![1.0, 1.0, 1.0], ValueRange::unit())
        .expect("valid metadata");
    PackedVolume::new(meta, vec![value; dims.x * dims.y * dims.z]).expect("matching length")
}

/// Volume uploaded into a float memory texture, ready for rendering
pub fn volume_texture(volume: &PackedVolume) -> VolumeTexture {
    let writer = VolumeTextureWriter::new(UploadOptions {
        precision: TextureFormat::Float32,
        memory_budget: None,
    });
    let mut texture = MemoryTexture::new();
    writer.allocate(volume, &mut texture).expect("allocation");
    writer.upload(volume, &mut texture).expect("upload");
    VolumeTexture::new(texture, *volume.metadata())
}
