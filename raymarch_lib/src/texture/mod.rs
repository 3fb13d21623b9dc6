//! Volume texture: destination contract, in-memory texture and the uploader.

mod memory_texture;
mod slot;
mod volume_texture;
mod writer;

use nalgebra::Vector3;

use crate::error::UploadError;

pub use memory_texture::MemoryTexture;
pub use slot::VolumeSlot;
pub use volume_texture::VolumeTexture;
pub use writer::{UploadOptions, VolumeTextureWriter};

/// Storage format of texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Unorm8,
    Unorm16,
    Float32,
}

impl TextureFormat {
    pub fn bytes_per_texel(&self) -> usize {
        match self {
            TextureFormat::Unorm8 => 1,
            TextureFormat::Unorm16 => 2,
            TextureFormat::Float32 => 4,
        }
    }

    /// Next cheaper format, `None` for the cheapest one
    pub fn downgrade(&self) -> Option<TextureFormat> {
        match self {
            TextureFormat::Float32 => Some(TextureFormat::Unorm16),
            TextureFormat::Unorm16 => Some(TextureFormat::Unorm8),
            TextureFormat::Unorm8 => None,
        }
    }
}

/// Box of texels, given by its lowest corner and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: Vector3<usize>,
    pub size: Vector3<usize>,
}

impl Region {
    pub fn new(offset: Vector3<usize>, size: Vector3<usize>) -> Region {
        Region { offset, size }
    }

    /// Whole texture of dimensions `dims`
    pub fn whole(dims: Vector3<usize>) -> Region {
        Region {
            offset: Vector3::zeros(),
            size: dims,
        }
    }

    pub fn texel_count(&self) -> usize {
        self.size.x * self.size.y * self.size.z
    }

    pub fn fits(&self, dims: &Vector3<usize>) -> bool {
        (0..3).all(|i| self.offset[i] + self.size[i] <= dims[i])
    }
}

/// Quantized texel data, layout `x + y * sx + z * sx * sy` of the written region
#[derive(Debug, Clone, PartialEq)]
pub enum Texels {
    Unorm8(Vec<u8>),
    Unorm16(Vec<u16>),
    Float32(Vec<f32>),
}

impl Texels {
    /// Quantize normalized values, `round(clamp(v) * max)` for integer formats
    pub fn quantize(values: &[f32], format: TextureFormat) -> Texels {
        match format {
            TextureFormat::Unorm8 => Texels::Unorm8(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8)
                    .collect(),
            ),
            TextureFormat::Unorm16 => Texels::Unorm16(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
                    .collect(),
            ),
            TextureFormat::Float32 => {
                Texels::Float32(values.iter().map(|v| v.clamp(0.0, 1.0)).collect())
            }
        }
    }

    /// Zero filled texels
    pub fn zeroed(format: TextureFormat, len: usize) -> Texels {
        match format {
            TextureFormat::Unorm8 => Texels::Unorm8(vec![0; len]),
            TextureFormat::Unorm16 => Texels::Unorm16(vec![0; len]),
            TextureFormat::Float32 => Texels::Float32(vec![0.0; len]),
        }
    }

    pub fn format(&self) -> TextureFormat {
        match self {
            Texels::Unorm8(_) => TextureFormat::Unorm8,
            Texels::Unorm16(_) => TextureFormat::Unorm16,
            Texels::Float32(_) => TextureFormat::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Texels::Unorm8(t) => t.len(),
            Texels::Unorm16(t) => t.len(),
            Texels::Float32(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Texel `i` as normalized value
    pub fn value(&self, i: usize) -> Option<f32> {
        match self {
            Texels::Unorm8(t) => t.get(i).map(|&v| v as f32 / u8::MAX as f32),
            Texels::Unorm16(t) => t.get(i).map(|&v| v as f32 / u16::MAX as f32),
            Texels::Float32(t) => t.get(i).copied(),
        }
    }
}

/// Engine texture object the volume gets uploaded into.
///
/// Implementor only has to honor the write contract, writer never reads texels back.
pub trait TextureDestination {
    /// `None` if no storage is allocated
    fn dimensions(&self) -> Option<Vector3<usize>>;

    /// `None` if no storage is allocated
    fn format(&self) -> Option<TextureFormat>;

    /// (Re)allocate storage, previous content is lost
    fn resize(&mut self, dims: Vector3<usize>, format: TextureFormat);

    /// Write texels into region.
    /// Nothing is written on error.
    fn write(&mut self, region: &Region, texels: Texels) -> Result<(), UploadError>;
}

#[cfg(test)]
mod test {
    use nalgebra::vector;

    use super::*;

    #[test]
    fn quantization() {
        let values = [0.0, 0.5, 1.0, 1.5, -0.2];

        assert_eq!(
            Texels::quantize(&values, TextureFormat::Unorm8),
            Texels::Unorm8(vec![0, 128, 255, 255, 0])
        );
        assert_eq!(
            Texels::quantize(&values, TextureFormat::Unorm16),
            Texels::Unorm16(vec![0, 32768, 65535, 65535, 0])
        );
        assert_eq!(
            Texels::quantize(&values, TextureFormat::Float32),
            Texels::Float32(vec![0.0, 0.5, 1.0, 1.0, 0.0])
        );
    }

    #[test]
    fn texel_values() {
        let texels = Texels::Unorm8(vec![0, 255, 51]);

        assert_eq!(texels.value(1), Some(1.0));
        assert_eq!(texels.value(2), Some(0.2));
        assert_eq!(texels.value(3), None);
        assert_eq!(texels.format(), TextureFormat::Unorm8);
    }

    #[test]
    fn downgrade_chain() {
        assert_eq!(
            TextureFormat::Float32.downgrade(),
            Some(TextureFormat::Unorm16)
        );
        assert_eq!(TextureFormat::Unorm16.downgrade(), Some(TextureFormat::Unorm8));
        assert_eq!(TextureFormat::Unorm8.downgrade(), None);
    }

    #[test]
    fn region_fits() {
        let dims = vector![4, 4, 4];

        assert!(Region::whole(dims).fits(&dims));
        assert!(Region::new(vector![2, 0, 3], vector![2, 4, 1]).fits(&dims));
        assert!(!Region::new(vector![3, 0, 0], vector![2, 1, 1]).fits(&dims));
        assert_eq!(Region::new(vector![0, 0, 0], vector![2, 3, 4]).texel_count(), 24);
    }
}
