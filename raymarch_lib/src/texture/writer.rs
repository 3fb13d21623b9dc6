use log::{debug, info, warn};

use crate::{error::UploadError, volumetric::PackedVolume};

use super::{Region, TextureDestination, TextureFormat, Texels};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadOptions {
    /// Requested texel precision
    pub precision: TextureFormat,
    /// Maximum size of texture storage in bytes, unlimited if `None`
    pub memory_budget: Option<usize>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        UploadOptions {
            precision: TextureFormat::Float32,
            memory_budget: None,
        }
    }
}

/// Quantizes packed volumes and writes them into texture destinations
#[derive(Debug, Clone, Default)]
pub struct VolumeTextureWriter {
    options: UploadOptions,
}

impl VolumeTextureWriter {
    pub fn new(options: UploadOptions) -> VolumeTextureWriter {
        VolumeTextureWriter { options }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Format used for a volume of `voxel_count` voxels.
    ///
    /// Requested precision is lowered until the texture fits the memory budget.
    pub fn storage_format(&self, voxel_count: usize) -> Result<TextureFormat, UploadError> {
        let budget = match self.options.memory_budget {
            Some(budget) => budget,
            None => return Ok(self.options.precision),
        };

        let mut format = self.options.precision;
        loop {
            let bytes = voxel_count.saturating_mul(format.bytes_per_texel());
            if bytes <= budget {
                if format != self.options.precision {
                    warn!(
                        "Texture precision lowered from {:?} to {format:?} to fit {budget} bytes",
                        self.options.precision
                    );
                }
                return Ok(format);
            }
            format = match format.downgrade() {
                Some(lower) => lower,
                None => {
                    return Err(UploadError::OverBudget {
                        voxels: voxel_count,
                        budget,
                    })
                }
            };
        }
    }

    /// Allocate destination storage fitting the volume
    pub fn allocate<D>(&self, volume: &PackedVolume, dest: &mut D) -> Result<TextureFormat, UploadError>
    where
        D: TextureDestination + ?Sized,
    {
        let format = self.storage_format(volume.metadata().voxel_count())?;
        dest.resize(volume.dims(), format);
        debug!("Allocated texture {:?} {format:?}", volume.dims());
        Ok(format)
    }

    /// Write the whole volume.
    ///
    /// Destination must already have the volume dimensions and the storage format,
    /// writer never resizes it.
    pub fn upload<D>(&self, volume: &PackedVolume, dest: &mut D) -> Result<TextureFormat, UploadError>
    where
        D: TextureDestination + ?Sized,
    {
        let dims = volume.dims();
        let format = self.storage_format(volume.metadata().voxel_count())?;

        if dest.dimensions() != Some(dims) {
            return Err(UploadError::DimensionMismatch {
                destination: dest.dimensions(),
                volume: dims,
            });
        }
        if dest.format() != Some(format) {
            return Err(UploadError::FormatMismatch {
                destination: dest.format(),
                requested: format,
            });
        }

        dest.write(&Region::whole(dims), Texels::quantize(volume.data(), format))?;

        info!("Uploaded volume {dims:?} as {format:?}");
        Ok(format)
    }

    /// Write a sub-volume of `volume` into the same region of the destination
    pub fn upload_region<D>(
        &self,
        volume: &PackedVolume,
        region: &Region,
        dest: &mut D,
    ) -> Result<(), UploadError>
    where
        D: TextureDestination + ?Sized,
    {
        let dims = volume.dims();
        if dest.dimensions() != Some(dims) {
            return Err(UploadError::DimensionMismatch {
                destination: dest.dimensions(),
                volume: dims,
            });
        }

        let values = volume
            .region(region.offset, region.size)
            .ok_or(UploadError::RegionOutOfBounds {
                region: *region,
                dims,
            })?;

        self.overwrite_region(region, &values, dest)
    }

    /// Write normalized values into a region of an allocated destination.
    /// Values are laid out like the region, `x` fastest.
    pub fn overwrite_region<D>(
        &self,
        region: &Region,
        values: &[f32],
        dest: &mut D,
    ) -> Result<(), UploadError>
    where
        D: TextureDestination + ?Sized,
    {
        let (dims, format) = match (dest.dimensions(), dest.format()) {
            (Some(dims), Some(format)) => (dims, format),
            _ => {
                return Err(UploadError::FormatMismatch {
                    destination: None,
                    requested: self.options.precision,
                })
            }
        };

        if !region.fits(&dims) {
            return Err(UploadError::RegionOutOfBounds {
                region: *region,
                dims,
            });
        }
        if values.len() != region.texel_count() {
            return Err(UploadError::DataLength {
                expected: region.texel_count(),
                actual: values.len(),
            });
        }

        dest.write(region, Texels::quantize(values, format))?;
        debug!("Updated region {:?} of {:?}", region, dims);
        Ok(())
    }
}
