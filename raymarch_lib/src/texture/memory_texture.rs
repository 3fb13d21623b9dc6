use nalgebra::Vector3;

use crate::{error::UploadError, volumetric::Volume};

use super::{Region, TextureDestination, TextureFormat, Texels};

/// Texture living in main memory.
///
/// Used as the render source of the CPU raymarcher and as a test destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTexture {
    dims: Option<Vector3<usize>>,
    texels: Option<Texels>,
    writes: usize,
}

impl MemoryTexture {
    /// Texture without storage
    pub fn new() -> MemoryTexture {
        MemoryTexture::default()
    }

    /// Zero filled texture
    pub fn allocated(dims: Vector3<usize>, format: TextureFormat) -> MemoryTexture {
        let mut texture = MemoryTexture::new();
        texture.resize(dims, format);
        texture
    }

    pub fn texels(&self) -> Option<&Texels> {
        self.texels.as_ref()
    }

    /// Number of successful writes since the last resize
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn index(dims: &Vector3<usize>, x: usize, y: usize, z: usize) -> usize {
        x + y * dims.x + z * dims.x * dims.y
    }
}

/// Copy rows of `src` (layout of `region`) into `dst` (layout of `dims`)
fn copy_region<T: Copy>(dst: &mut [T], dims: &Vector3<usize>, region: &Region, src: &[T]) {
    let row = region.size.x;
    let mut src_start = 0;
    for z in region.offset.z..region.offset.z + region.size.z {
        for y in region.offset.y..region.offset.y + region.size.y {
            let dst_start = MemoryTexture::index(dims, region.offset.x, y, z);
            dst[dst_start..dst_start + row].copy_from_slice(&src[src_start..src_start + row]);
            src_start += row;
        }
    }
}

impl TextureDestination for MemoryTexture {
    fn dimensions(&self) -> Option<Vector3<usize>> {
        self.dims
    }

    fn format(&self) -> Option<TextureFormat> {
        self.texels.as_ref().map(Texels::format)
    }

    fn resize(&mut self, dims: Vector3<usize>, format: TextureFormat) {
        self.dims = Some(dims);
        self.texels = Some(Texels::zeroed(format, dims.x * dims.y * dims.z));
        self.writes = 0;
    }

    fn write(&mut self, region: &Region, texels: Texels) -> Result<(), UploadError> {
        let (dims, storage) = match (self.dims, self.texels.as_mut()) {
            (Some(dims), Some(storage)) => (dims, storage),
            _ => {
                return Err(UploadError::FormatMismatch {
                    destination: None,
                    requested: texels.format(),
                })
            }
        };

        if !region.fits(&dims) {
            return Err(UploadError::RegionOutOfBounds {
                region: *region,
                dims,
            });
        }
        if texels.len() != region.texel_count() {
            return Err(UploadError::DataLength {
                expected: region.texel_count(),
                actual: texels.len(),
            });
        }

        match (storage, texels) {
            (Texels::Unorm8(dst), Texels::Unorm8(src)) => copy_region(dst, &dims, region, &src),
            (Texels::Unorm16(dst), Texels::Unorm16(src)) => copy_region(dst, &dims, region, &src),
            (Texels::Float32(dst), Texels::Float32(src)) => copy_region(dst, &dims, region, &src),
            (storage, texels) => {
                return Err(UploadError::FormatMismatch {
                    destination: Some(storage.format()),
                    requested: texels.format(),
                })
            }
        }

        self.writes += 1;
        Ok(())
    }
}

impl Volume for MemoryTexture {
    fn get_size(&self) -> Vector3<usize> {
        self.dims.unwrap_or_else(Vector3::zeros)
    }

    fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        let dims = self.dims?;
        if x >= dims.x || y >= dims.y || z >= dims.z {
            return None;
        }
        self.texels.as_ref()?.value(Self::index(&dims, x, y, z))
    }
}
